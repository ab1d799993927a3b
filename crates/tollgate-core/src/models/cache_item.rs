use serde::{Deserialize, Serialize};

/// A cached value with its bookkeeping. Times are Unix millis, `ttl` is
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheItem<T> {
    pub data: T,
    pub timestamp: i64,
    pub ttl: u64,
    pub access_count: u64,
    pub last_accessed: i64,
}

impl<T> CacheItem<T> {
    pub fn new(data: T, now: i64, ttl: u64) -> Self {
        Self {
            data,
            timestamp: now,
            ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Expired iff strictly more than `ttl` has elapsed since it was written.
    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) > i64::try_from(self.ttl).unwrap_or(i64::MAX)
    }

    /// Record a read.
    pub fn touch(&mut self, now: i64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now;
    }
}

/// Item counts for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub items: usize,
    pub valid: usize,
    pub expired: usize,
    pub approximate_bytes: usize,
}

/// Snapshot of cache health.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub memory: TierStats,
    pub durable: TierStats,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 before the first lookup.
    pub hit_rate: f64,
}
