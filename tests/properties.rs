use proptest::prelude::*;
use resource_orchestrator::cache::RecordCache;
use resource_orchestrator::model::{Phase, RecordId, SortOrder};
use resource_orchestrator::query::{reduce, QueryAction, QueryState};
use resource_orchestrator::store::LoadingCounter;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop_oneof![Just(Phase::Start), Just(Phase::Cancel)]
}

proptest! {
    /// Sorting on one field flips between ASC and DESC and always goes back
    /// to the first page.
    #[test]
    fn set_sort_alternates_order_and_resets_page(page in 1u32..50, repeats in 1usize..8) {
        let mut state = QueryState { page, ..QueryState::default() };
        let mut expected = SortOrder::Asc;
        for _ in 0..repeats {
            state = reduce(&state, &QueryAction::SetSort("title".into()));
            prop_assert_eq!(state.page, 1);
            prop_assert_eq!(state.sort.as_deref(), Some("title"));
            prop_assert_eq!(state.order, Some(expected));
            expected = expected.toggled();
        }
    }

    #[test]
    fn set_page_keeps_sort_and_filter(page in 1u32..1000) {
        let mut state = reduce(&QueryState::default(), &QueryAction::SetSort("id".into()));
        state.filter.insert("q".into(), json!("rust"));
        let next = reduce(&state, &QueryAction::SetPage(page));
        prop_assert_eq!(next.page, page);
        prop_assert_eq!(next.sort, state.sort);
        prop_assert_eq!(next.filter, state.filter);
    }

    /// However many terminal phases arrive, the counter never underflows.
    #[test]
    fn loading_counter_never_negative(phases in proptest::collection::vec(phase_strategy(), 0..64)) {
        let mut counter = LoadingCounter::default();
        let mut starts = 0u64;
        let mut ends = 0u64;
        for phase in &phases {
            counter = counter.apply(phase);
            match phase {
                Phase::Start => starts += 1,
                _ => ends += 1,
            }
            prop_assert!(counter.count() <= starts);
        }
        if ends == 0 {
            prop_assert_eq!(counter.count(), starts);
        }
    }

    /// Merging nothing keeps exactly the entries that are still fresh.
    #[test]
    fn empty_merge_keeps_only_fresh_entries(
        ids in proptest::collection::btree_set(0i64..100, 0..20),
        elapsed_secs in 0u64..1200,
    ) {
        let ttl = Duration::from_secs(600);
        let start = Instant::now();
        let records: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();

        let mut cache = RecordCache::new(ttl);
        cache.merge("posts", &records, start);
        cache.merge("posts", &[], start + Duration::from_secs(elapsed_secs));

        let expected = if elapsed_secs <= 600 { ids.len() } else { 0 };
        let kept = ids
            .iter()
            .filter(|id| cache.get("posts", &RecordId::from(**id)).is_some())
            .count();
        prop_assert_eq!(kept, expected);
    }
}
