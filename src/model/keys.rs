//! Typed composite keys for the reference indices.
//!
//! Both keys replace ad-hoc string concatenation (`posts_comments@12`,
//! `comments@post_id`) so two different relations can never collide.

use crate::model::RecordId;
use serde::Serialize;
use std::fmt;

/// Names a one-to-many relation instance: the `reference` records whose
/// `target` field points at record `id` of `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationKey {
    pub resource: String,
    pub reference: String,
    pub id: RecordId,
    pub target: String,
}

impl RelationKey {
    pub fn new(
        resource: impl Into<String>,
        reference: impl Into<String>,
        id: impl Into<RecordId>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            reference: reference.into(),
            id: id.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}].{} <- {}", self.resource, self.id, self.target, self.reference)
    }
}

/// Names the input that asked for "possible values": field `source` of a
/// `resource` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReferenceSource {
    pub resource: String,
    pub source: String,
}

impl ReferenceSource {
    pub fn new(resource: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.source)
    }
}
