//! Requests issued by widgets and the parameters they carry.

use crate::model::{RecordId, ReferenceSource, RelationKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The closed set of operations the engine knows how to run.
///
/// Every place that reacts to a request matches on this enum exhaustively, so
/// adding a kind is a compile error until every reducer and the effect table
/// have decided what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    GetList,
    GetOne,
    GetMany,
    GetManyReference,
    GetMatching,
    Create,
    Update,
    Delete,
}

impl RequestKind {
    pub const ALL: [RequestKind; 8] = [
        RequestKind::GetList,
        RequestKind::GetOne,
        RequestKind::GetMany,
        RequestKind::GetManyReference,
        RequestKind::GetMatching,
        RequestKind::Create,
        RequestKind::Update,
        RequestKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::GetList => "GET_LIST",
            RequestKind::GetOne => "GET_ONE",
            RequestKind::GetMany => "GET_MANY",
            RequestKind::GetManyReference => "GET_MANY_REFERENCE",
            RequestKind::GetMatching => "GET_MATCHING",
            RequestKind::Create => "CREATE",
            RequestKind::Update => "UPDATE",
            RequestKind::Delete => "DELETE",
        }
    }

    /// Primary views (a list page, a detail page) only care about the latest
    /// request, so they supersede. Everything else runs concurrently.
    pub fn supersedes_by_default(&self) -> bool {
        matches!(self, RequestKind::GetList | RequestKind::GetOne)
    }

    /// Whether a successful response carries an array of records rather
    /// than a single record.
    pub fn returns_many(&self) -> bool {
        matches!(
            self,
            RequestKind::GetList
                | RequestKind::GetMany
                | RequestKind::GetManyReference
                | RequestKind::GetMatching
        )
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

/// Free-form filter object, passed through to the transport untouched.
pub type Filter = Map<String, Value>;

/// Pagination, sort and filter of a list-shaped read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListParams {
    pub pagination: Pagination,
    pub sort: Sort,
    pub filter: Filter,
}

impl ListParams {
    pub fn new(pagination: Pagination, sort: Sort, filter: Filter) -> Self {
        Self {
            pagination,
            sort,
            filter,
        }
    }
}

/// Where to navigate after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Redirect {
    List,
    Create,
    Edit,
    Show,
    /// A literal path, used verbatim.
    Path(String),
    /// Stay where we are.
    None,
}

/// Operation-specific data of a [`Request`].
///
/// One variant per [`RequestKind`]; `Payload::kind` is the only way to get a
/// kind out of a request, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    GetList(ListParams),
    GetOne {
        id: RecordId,
        base_path: Option<String>,
    },
    GetMany {
        ids: Vec<RecordId>,
    },
    GetManyReference {
        target: String,
        id: RecordId,
        related_to: RelationKey,
        params: ListParams,
    },
    GetMatching {
        related_to: ReferenceSource,
        params: ListParams,
    },
    Create {
        data: Value,
        base_path: Option<String>,
        redirect_to: Redirect,
    },
    Update {
        id: RecordId,
        data: Value,
        previous_data: Option<Value>,
        base_path: Option<String>,
        redirect_to: Redirect,
    },
    Delete {
        id: RecordId,
        base_path: Option<String>,
        redirect_to: Redirect,
    },
}

impl Payload {
    pub fn kind(&self) -> RequestKind {
        match self {
            Payload::GetList(_) => RequestKind::GetList,
            Payload::GetOne { .. } => RequestKind::GetOne,
            Payload::GetMany { .. } => RequestKind::GetMany,
            Payload::GetManyReference { .. } => RequestKind::GetManyReference,
            Payload::GetMatching { .. } => RequestKind::GetMatching,
            Payload::Create { .. } => RequestKind::Create,
            Payload::Update { .. } => RequestKind::Update,
            Payload::Delete { .. } => RequestKind::Delete,
        }
    }

    /// The record id this request targets, for kinds that have one.
    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Payload::GetOne { id, .. }
            | Payload::GetManyReference { id, .. }
            | Payload::Update { id, .. }
            | Payload::Delete { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn base_path(&self) -> Option<&str> {
        match self {
            Payload::GetOne { base_path, .. }
            | Payload::Create { base_path, .. }
            | Payload::Update { base_path, .. }
            | Payload::Delete { base_path, .. } => base_path.as_deref(),
            _ => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Payload::Create { redirect_to, .. }
            | Payload::Update { redirect_to, .. }
            | Payload::Delete { redirect_to, .. } => Some(redirect_to),
            _ => None,
        }
    }
}

/// A single "I need this data" request.
///
/// Immutable once built; the builders below only exist to pick the defaults
/// each kind ships with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub resource: String,
    pub payload: Payload,
    pub cancel_previous: bool,
}

impl Request {
    /// Builds a request with the cancellation policy its kind defaults to.
    pub fn new(resource: impl Into<String>, payload: Payload) -> Self {
        let cancel_previous = payload.kind().supersedes_by_default();
        Self {
            resource: resource.into(),
            payload,
            cancel_previous,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.payload.kind()
    }

    pub fn with_cancel_previous(mut self, cancel_previous: bool) -> Self {
        self.cancel_previous = cancel_previous;
        self
    }

    /// Overrides the redirect of a mutation. No-op on read requests.
    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        match &mut self.payload {
            Payload::Create { redirect_to, .. }
            | Payload::Update { redirect_to, .. }
            | Payload::Delete { redirect_to, .. } => *redirect_to = redirect,
            _ => {}
        }
        self
    }

    pub fn get_list(
        resource: impl Into<String>,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Self {
        Self::new(resource, Payload::GetList(ListParams::new(pagination, sort, filter)))
    }

    pub fn get_one(
        resource: impl Into<String>,
        id: impl Into<RecordId>,
        base_path: Option<String>,
    ) -> Self {
        Self::new(
            resource,
            Payload::GetOne {
                id: id.into(),
                base_path,
            },
        )
    }

    pub fn get_many(resource: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self::new(resource, Payload::GetMany { ids })
    }

    pub fn get_matching(
        reference: impl Into<String>,
        related_to: ReferenceSource,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Self {
        Self::new(
            reference,
            Payload::GetMatching {
                related_to,
                params: ListParams::new(pagination, sort, filter),
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn get_many_reference(
        reference: impl Into<String>,
        target: impl Into<String>,
        id: impl Into<RecordId>,
        related_to: RelationKey,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Self {
        Self::new(
            reference,
            Payload::GetManyReference {
                target: target.into(),
                id: id.into(),
                related_to,
                params: ListParams::new(pagination, sort, filter),
            },
        )
    }

    pub fn create(resource: impl Into<String>, data: Value, base_path: Option<String>) -> Self {
        Self::new(
            resource,
            Payload::Create {
                data,
                base_path,
                redirect_to: Redirect::Edit,
            },
        )
    }

    pub fn update(
        resource: impl Into<String>,
        id: impl Into<RecordId>,
        data: Value,
        previous_data: Option<Value>,
        base_path: Option<String>,
    ) -> Self {
        Self::new(
            resource,
            Payload::Update {
                id: id.into(),
                data,
                previous_data,
                base_path,
                redirect_to: Redirect::Show,
            },
        )
    }

    pub fn delete(
        resource: impl Into<String>,
        id: impl Into<RecordId>,
        base_path: Option<String>,
    ) -> Self {
        Self::new(
            resource,
            Payload::Delete {
                id: id.into(),
                base_path,
                redirect_to: Redirect::List,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn by_id() -> Sort {
        Sort::new("id", SortOrder::Desc)
    }

    #[test]
    fn test_default_cancel_policy_per_kind() {
        let list = Request::get_list("posts", Pagination::new(1, 10), by_id(), Filter::new());
        let one = Request::get_one("posts", 1, None);
        let many = Request::get_many("posts", vec![1.into()]);
        let create = Request::create("posts", json!({}), None);
        let delete = Request::delete("posts", 1, None);

        assert!(list.cancel_previous);
        assert!(one.cancel_previous);
        assert!(!many.cancel_previous);
        assert!(!create.cancel_previous);
        assert!(!delete.cancel_previous);
    }

    #[test]
    fn test_mutation_redirect_defaults() {
        let create = Request::create("posts", json!({}), Some("/posts".into()));
        let update = Request::update("posts", 1, json!({}), None, None);
        let delete = Request::delete("posts", 1, None);

        assert_eq!(create.payload.redirect(), Some(&Redirect::Edit));
        assert_eq!(update.payload.redirect(), Some(&Redirect::Show));
        assert_eq!(delete.payload.redirect(), Some(&Redirect::List));
    }

    #[test]
    fn test_with_redirect_ignores_reads() {
        let one = Request::get_one("posts", 1, None).with_redirect(Redirect::Show);
        assert_eq!(one.payload.redirect(), None);

        let update = Request::update("posts", 1, json!({}), None, None).with_redirect(Redirect::None);
        assert_eq!(update.payload.redirect(), Some(&Redirect::None));
    }

    #[test]
    fn test_payload_serializes_with_kind_tag() {
        let request = Request::get_one("posts", 3, Some("/posts".into()));
        let value = serde_json::to_value(&request.payload).unwrap();
        assert_eq!(value["kind"], "GET_ONE");
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn test_every_kind_has_a_distinct_name() {
        let names: std::collections::HashSet<_> =
            RequestKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), RequestKind::ALL.len());
    }
}
