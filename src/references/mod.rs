//! Relational lookups derived from fetched records.
//!
//! Two indices, both rebuilt wholesale per key on each relevant success:
//! - **one-to-many**: for a [`RelationKey`], the ids of the `reference`
//!   records pointing at one record (filled by `GET_MANY_REFERENCE`);
//! - **possible values**: for a [`ReferenceSource`], the ids a reference
//!   input may choose from (filled by `GET_MATCHING`).
//!
//! Entries only hold ids. Records are resolved through the
//! [`RecordCache`] at read time.

use crate::cache::RecordCache;
use crate::model::{record_id, Record, RecordId, ReferenceSource, RelationKey};
use std::collections::HashMap;

/// State of a possible-values entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PossibleValues {
    Ids(Vec<RecordId>),
    /// The last `GET_MATCHING` failed with this message.
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    one_to_many: HashMap<RelationKey, Vec<RecordId>>,
    possible_values: HashMap<ReferenceSource, PossibleValues>,
}

fn ids_of(records: &[Record]) -> Vec<RecordId> {
    records.iter().filter_map(record_id).collect()
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_one_to_many(&mut self, key: RelationKey, records: &[Record]) {
        self.one_to_many.insert(key, ids_of(records));
    }

    pub fn set_possible_values(&mut self, source: ReferenceSource, records: &[Record]) {
        self.possible_values
            .insert(source, PossibleValues::Ids(ids_of(records)));
    }

    pub fn set_possible_values_error(&mut self, source: ReferenceSource, message: String) {
        self.possible_values
            .insert(source, PossibleValues::Error(message));
    }

    /// Ids related through `key`; `None` until the relation was fetched once.
    pub fn one_to_many_ids(&self, key: &RelationKey) -> Option<&[RecordId]> {
        self.one_to_many.get(key).map(Vec::as_slice)
    }

    /// Related records resolved from `cache`, in index order.
    pub fn references(&self, cache: &RecordCache, key: &RelationKey) -> Option<Vec<Record>> {
        self.one_to_many_ids(key)
            .map(|ids| cache.get_many(&key.reference, ids))
    }

    pub fn possible_values(&self, source: &ReferenceSource) -> Option<&PossibleValues> {
        self.possible_values.get(source)
    }

    /// The records a reference input can offer.
    ///
    /// - `None` while the choices were never fetched.
    /// - `Some(Err(message))` if the last fetch failed.
    /// - Otherwise the matching records, with any `selected` id that the
    ///   match left out put first so the current value stays selectable.
    ///   Ids whose record is not cached are skipped.
    pub fn possible_references(
        &self,
        cache: &RecordCache,
        source: &ReferenceSource,
        reference: &str,
        selected: &[RecordId],
    ) -> Option<Result<Vec<Record>, String>> {
        let ids = match self.possible_values.get(source)? {
            PossibleValues::Error(message) => return Some(Err(message.clone())),
            PossibleValues::Ids(ids) => ids,
        };

        let mut choices = ids.clone();
        for id in selected {
            if !choices.contains(id) {
                choices.insert(0, id.clone());
            }
        }
        Some(Ok(cache.get_many(reference, &choices)))
    }
}
