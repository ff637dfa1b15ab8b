//! Pagination, sort and filter state of a list view.
//!
//! A pure state machine: [`reduce`] never touches anything but its arguments.
//! Widgets keep one [`QueryState`] per list and build their `GET_LIST`
//! request from it.

use crate::model::{Filter, ListParams, Pagination, Sort, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub page: u32,
    pub per_page: Option<u32>,
    pub filter: Filter,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            sort: None,
            order: None,
            page: 1,
            per_page: None,
            filter: Filter::new(),
        }
    }
}

impl QueryState {
    /// Turns the state into list request parameters, filling the unset parts
    /// from the view's defaults.
    pub fn to_params(&self, default_sort: &Sort, default_per_page: u32) -> ListParams {
        let sort = match &self.sort {
            Some(field) => Sort::new(field.clone(), self.order.unwrap_or(SortOrder::Asc)),
            None => default_sort.clone(),
        };
        ListParams::new(
            Pagination::new(self.page, self.per_page.unwrap_or(default_per_page)),
            sort,
            self.filter.clone(),
        )
    }
}

/// The only legal transitions of a [`QueryState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryAction {
    SetSort(String),
    SetPage(u32),
    SetFilter(Filter),
}

/// Applies one transition.
pub fn reduce(state: &QueryState, action: &QueryAction) -> QueryState {
    match action {
        QueryAction::SetSort(field) => {
            if state.sort.as_deref() == Some(field.as_str()) {
                QueryState {
                    order: Some(state.order.unwrap_or(SortOrder::Asc).toggled()),
                    page: 1,
                    ..state.clone()
                }
            } else {
                QueryState {
                    sort: Some(field.clone()),
                    order: Some(SortOrder::Asc),
                    page: 1,
                    ..state.clone()
                }
            }
        }
        QueryAction::SetPage(page) => QueryState {
            page: *page,
            ..state.clone()
        },
        QueryAction::SetFilter(filter) => QueryState {
            filter: filter.clone(),
            page: 1,
            ..state.clone()
        },
    }
}

/// Applies a serialized action (`{"type": "SET_PAGE", "payload": 2}`).
///
/// Anything that does not decode to a [`QueryAction`] leaves the state as is.
pub fn reduce_raw(state: &QueryState, action: &Value) -> QueryState {
    match QueryAction::deserialize(action) {
        Ok(action) => reduce(state, &action),
        Err(e) => {
            debug!(error = %e, "Ignoring unrecognized query action");
            state.clone()
        }
    }
}
