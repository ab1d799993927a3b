use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use proptest::prelude::*;

use tollgate_cache::{CacheStore, MemoryTier};
use tollgate_core::clock::ManualClock;
use tollgate_core::config::CacheConfig;

fn store(capacity: usize) -> (CacheStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let config = CacheConfig {
        max_memory_items: capacity,
        ..CacheConfig::default()
    };
    (
        CacheStore::new(Arc::new(MemoryTier::new()), clock.clone(), config),
        clock,
    )
}

proptest! {
    #[test]
    fn memory_tier_never_exceeds_capacity(capacity in 1usize..50, inserts in 0usize..200) {
        let (store, clock) = store(capacity);
        for i in 0..inserts {
            store.set(&format!("k{i}"), &i, Duration::from_secs(60));
            clock.advance(ChronoDuration::milliseconds(1));
            prop_assert!(store.memory_len() <= capacity);
        }
    }

    #[test]
    fn set_get_is_identity_within_ttl(
        key in "[a-z:]{1,24}",
        value in any::<i64>(),
        ttl_secs in 1u64..10_000,
        elapsed_secs in 0u64..10_000,
    ) {
        let (store, clock) = store(1000);
        store.set(&key, &value, Duration::from_secs(ttl_secs));
        clock.advance(ChronoDuration::seconds(elapsed_secs as i64));
        let got = store.get::<i64>(&key);
        if elapsed_secs <= ttl_secs {
            prop_assert_eq!(got, Some(value));
        } else {
            prop_assert_eq!(got, None);
        }
    }

    #[test]
    fn latest_write_wins(values in proptest::collection::vec(any::<u32>(), 1..20)) {
        let (store, _) = store(1000);
        for v in &values {
            store.set("k", v, Duration::from_secs(60));
        }
        prop_assert_eq!(store.get::<u32>("k"), values.last().copied());
    }
}
