//! Everything the engine knows, and how lifecycle events change it.

use crate::cache::{ListState, RecordCache};
use crate::model::{LifecycleEvent, Payload, Phase, Record};
use crate::references::ReferenceIndex;
use crate::store::LoadingCounter;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// The engine's whole in-memory state.
///
/// Only [`AdminState::apply`] changes it, and only the store actor calls that,
/// so concurrent terminal events are serialized by construction.
#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub cache: RecordCache,
    pub lists: HashMap<String, ListState>,
    pub references: ReferenceIndex,
    pub loading: LoadingCounter,
}

impl AdminState {
    pub fn new(freshness_ttl: Duration) -> Self {
        Self {
            cache: RecordCache::new(freshness_ttl),
            ..Default::default()
        }
    }

    /// Folds one lifecycle event into the state. `now` stamps merged records.
    pub fn apply(&mut self, event: &LifecycleEvent, now: Instant) {
        self.loading = self.loading.apply(&event.phase);

        let resource = event.resource();
        match &event.phase {
            Phase::Start | Phase::Cancel => {}
            Phase::Success(response) => {
                let many = || records_of(event, &response.data);
                match &event.request.payload {
                    Payload::GetList(_) => {
                        let records = many();
                        self.cache.merge(resource, records, now);
                        self.lists.insert(
                            resource.to_string(),
                            ListState::from_page(records, response.total),
                        );
                    }
                    Payload::GetMany { .. } => self.cache.merge(resource, many(), now),
                    Payload::GetManyReference { related_to, .. } => {
                        let records = many();
                        self.cache.merge(resource, records, now);
                        self.references.set_one_to_many(related_to.clone(), records);
                    }
                    Payload::GetMatching { related_to, .. } => {
                        let records = many();
                        self.cache.merge(resource, records, now);
                        self.references.set_possible_values(related_to.clone(), records);
                    }
                    Payload::GetOne { .. } | Payload::Create { .. } | Payload::Update { .. } => {
                        self.cache
                            .merge(resource, std::slice::from_ref(&response.data), now);
                    }
                    Payload::Delete { .. } => {}
                }
            }
            Phase::Failure(error) => {
                if let Payload::GetMatching { related_to, .. } = &event.request.payload {
                    self.references
                        .set_possible_values_error(related_to.clone(), error.message());
                }
            }
        }
    }

    pub fn list(&self, resource: &str) -> ListState {
        self.lists.get(resource).cloned().unwrap_or_default()
    }
}

fn records_of<'a>(event: &LifecycleEvent, data: &'a Value) -> &'a [Record] {
    match data.as_array() {
        Some(records) => records.as_slice(),
        None => {
            warn!(kind = %event.kind(), resource = event.resource(), "Expected an array of records");
            &[]
        }
    }
}
