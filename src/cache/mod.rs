//! Freshness-aware record cache.
//!
//! # Merge algorithm (stale-while-revalidate, lazy TTL eviction)
//!
//! When new records for a resource arrive:
//! 1. every incoming record is stamped with `fetched_at = now`;
//! 2. previously cached records older than the freshness window are dropped;
//! 3. the survivors and the new records are combined, new ones winning on
//!    id collisions.
//!
//! Nothing is ever evicted by a timer. A stale record stays readable until the
//! next merge into the same resource, so a view never blanks out while it is
//! being refreshed.

pub mod list;

pub use list::ListState;

use crate::model::{record_id, Record, RecordId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Default freshness window: ten minutes.
pub const DEFAULT_FRESHNESS_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq)]
struct CachedRecord {
    value: Record,
    fetched_at: Instant,
}

/// Cached records of a single resource.
///
/// A record and its fetch time are stored together, so every cached id
/// always has exactly one timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    entries: HashMap<RecordId, CachedRecord>,
}

impl ResourceData {
    /// Returns the state after merging `new_records` fetched at `now`.
    ///
    /// Records without a usable `id` cannot be cached and are skipped.
    pub fn merged(&self, new_records: &[Record], now: Instant, ttl: Duration) -> ResourceData {
        let mut entries: HashMap<RecordId, CachedRecord> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.fetched_at) <= ttl)
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        for record in new_records {
            match record_id(record) {
                Some(id) => {
                    entries.insert(
                        id,
                        CachedRecord {
                            value: record.clone(),
                            fetched_at: now,
                        },
                    );
                }
                None => warn!(?record, "Skipping record without id"),
            }
        }

        ResourceData { entries }
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.entries.get(id).map(|entry| &entry.value)
    }

    pub fn fetched_at(&self, id: &RecordId) -> Option<Instant> {
        self.entries.get(id).map(|entry| entry.fetched_at)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All cached records, one [`ResourceData`] per resource.
#[derive(Debug, Clone)]
pub struct RecordCache {
    resources: HashMap<String, ResourceData>,
    ttl: Duration,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_TTL)
    }
}

impl RecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            resources: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Merges `records` into `resource`, replacing that resource's data
    /// wholesale with the merge result.
    pub fn merge(&mut self, resource: &str, records: &[Record], now: Instant) {
        let next = self
            .resources
            .get(resource)
            .map(|data| data.merged(records, now, self.ttl))
            .unwrap_or_else(|| ResourceData::default().merged(records, now, self.ttl));
        self.resources.insert(resource.to_string(), next);
    }

    pub fn resource(&self, resource: &str) -> Option<&ResourceData> {
        self.resources.get(resource)
    }

    /// Pure lookup. `None` when never fetched or already evicted.
    pub fn get(&self, resource: &str, id: &RecordId) -> Option<&Record> {
        self.resources.get(resource).and_then(|data| data.get(id))
    }

    /// Resolves `ids` in order, skipping the ones not in cache.
    pub fn get_many(&self, resource: &str, ids: &[RecordId]) -> Vec<Record> {
        ids.iter()
            .filter_map(|id| self.get(resource, id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_fresh_records() {
        let t0 = Instant::now();
        let mut cache = RecordCache::default();
        cache.merge("posts", &[json!({ "id": 1, "title": "one" })], t0);
        cache.merge("posts", &[json!({ "id": 2, "title": "two" })], t0 + Duration::from_secs(1));

        assert!(cache.get("posts", &1.into()).is_some());
        assert!(cache.get("posts", &2.into()).is_some());
    }

    #[test]
    fn test_merge_evicts_records_past_the_window() {
        let t0 = Instant::now();
        let mut cache = RecordCache::default();
        cache.merge("posts", &[json!({ "id": 1 })], t0);
        cache.merge("posts", &[json!({ "id": 2 })], t0 + DEFAULT_FRESHNESS_TTL + Duration::from_secs(1));

        assert!(cache.get("posts", &1.into()).is_none());
        assert!(cache.get("posts", &2.into()).is_some());
    }

    #[test]
    fn test_stale_records_stay_visible_until_next_merge() {
        let t0 = Instant::now();
        let mut cache = RecordCache::new(Duration::from_secs(1));
        cache.merge("posts", &[json!({ "id": 1 })], t0);
        // No merge happened since: still readable, whatever the clock says.
        assert!(cache.get("posts", &1.into()).is_some());
        // A merge into another resource does not evict either.
        cache.merge("tags", &[json!({ "id": 1 })], t0 + Duration::from_secs(60));
        assert!(cache.get("posts", &1.into()).is_some());
    }

    #[test]
    fn test_new_record_overwrites_and_restamps() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(5);
        let data = ResourceData::default()
            .merged(&[json!({ "id": 1, "title": "old" })], t0, DEFAULT_FRESHNESS_TTL)
            .merged(&[json!({ "id": 1, "title": "new" })], t1, DEFAULT_FRESHNESS_TTL);

        assert_eq!(data.len(), 1);
        assert_eq!(data.get(&1.into()), Some(&json!({ "id": 1, "title": "new" })));
        assert_eq!(data.fetched_at(&1.into()), Some(t1));
    }

    #[test]
    fn test_refresh_keeps_record_alive() {
        let t0 = Instant::now();
        let ttl = Duration::from_secs(10);
        let data = ResourceData::default()
            .merged(&[json!({ "id": 1 })], t0, ttl)
            .merged(&[json!({ "id": 1 })], t0 + Duration::from_secs(8), ttl)
            .merged(&[json!({ "id": 2 })], t0 + Duration::from_secs(15), ttl);

        assert!(data.contains(&1.into()));
        assert!(data.contains(&2.into()));
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let data = ResourceData::default().merged(
            &[json!({ "title": "anonymous" }), json!({ "id": "a" })],
            Instant::now(),
            DEFAULT_FRESHNESS_TTL,
        );
        assert_eq!(data.len(), 1);
        assert!(data.contains(&"a".into()));
    }

    #[test]
    fn test_get_many_preserves_order_and_skips_missing() {
        let mut cache = RecordCache::default();
        cache.merge("tags", &[json!({ "id": 1 }), json!({ "id": 3 })], Instant::now());
        let records = cache.get_many("tags", &[3.into(), 2.into(), 1.into()]);
        assert_eq!(records, vec![json!({ "id": 3 }), json!({ "id": 1 })]);
    }
}
