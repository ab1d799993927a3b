//! Per-user, per-period usage counters.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use tollgate_cache::CacheStore;
use tollgate_core::clock::IClock;
use tollgate_core::constants::USAGE_KEY_PREFIX;
use tollgate_core::models::{billing_period, period_reset_date, FeatureId, UsageRecord};

/// Reads and increments [`UsageRecord`]s kept in the governor store under
/// `usage:<user>:<period>`.
pub struct UsageTracker {
    store: Arc<CacheStore>,
    clock: Arc<dyn IClock>,
    retention: Duration,
    // Serializes read-modify-write of counters.
    write_lock: Mutex<()>,
}

impl UsageTracker {
    pub fn new(store: Arc<CacheStore>, clock: Arc<dyn IClock>, retention: Duration) -> Self {
        Self {
            store,
            clock,
            retention,
            write_lock: Mutex::new(()),
        }
    }

    fn key(user_id: &str, period: &str) -> String {
        format!("{USAGE_KEY_PREFIX}:{user_id}:{period}")
    }

    /// Add `amount` units of `feature` to the current period for `user_id`.
    /// Returns the updated record.
    pub fn record_usage(&self, user_id: &str, feature: &FeatureId, amount: u64) -> UsageRecord {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let period = billing_period(self.clock.now());
        let key = Self::key(user_id, &period);
        let mut record = self
            .store
            .get::<UsageRecord>(&key)
            .unwrap_or_else(|| UsageRecord::new(period.clone()));
        record.increment(feature, amount);
        self.store.set(&key, &record, self.retention);
        debug!(user_id, feature = %feature, amount, period = %period, "usage recorded");
        record
    }

    /// Usage so far in the current period. A user with no record has used
    /// nothing.
    pub fn current_usage(&self, user_id: &str) -> UsageRecord {
        let period = billing_period(self.clock.now());
        self.store
            .get(&Self::key(user_id, &period))
            .unwrap_or_else(|| UsageRecord::new(period))
    }

    /// First instant of the next billing period.
    pub fn reset_date(&self) -> DateTime<Utc> {
        period_reset_date(self.clock.now())
    }

    /// Forget every period recorded for `user_id`.
    pub fn clear_usage(&self, user_id: &str) -> usize {
        self.store
            .invalidate_pattern(&format!("{USAGE_KEY_PREFIX}:{user_id}:"))
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("namespace", &self.store.namespace())
            .field("retention", &self.retention)
            .finish()
    }
}
