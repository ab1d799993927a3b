//! CacheStore: read-through coordinator over the memory and durable tiers.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use tollgate_core::clock::IClock;
use tollgate_core::config::CacheConfig;
use tollgate_core::constants::CACHE_NAMESPACE;
use tollgate_core::errors::{StorageError, TollgateError};
use tollgate_core::models::{CacheItem, CacheStats, TierStats};
use tollgate_core::traits::ICacheTier;

use crate::single_flight::SingleFlight;
use crate::tiers::memory::tally;
use crate::tiers::{Lookup, MemoryTier};

/// What a sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub memory_removed: usize,
    pub durable_removed: usize,
}

/// Two-tier cache scoped to one namespace of the durable tier.
///
/// Durable keys are `<namespace>:<key>`; memory keys are the bare logical
/// key since the memory tier is private to this store.
pub struct CacheStore {
    namespace: String,
    memory: MemoryTier,
    durable: Arc<dyn ICacheTier>,
    clock: Arc<dyn IClock>,
    config: CacheConfig,
    flights: SingleFlight,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    /// A store in the default `cache` namespace.
    pub fn new(durable: Arc<dyn ICacheTier>, clock: Arc<dyn IClock>, config: CacheConfig) -> Self {
        Self::with_namespace(CACHE_NAMESPACE, durable, clock, config)
    }

    pub fn with_namespace(
        namespace: &str,
        durable: Arc<dyn ICacheTier>,
        clock: Arc<dyn IClock>,
        config: CacheConfig,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            memory: MemoryTier::new(),
            durable,
            clock,
            config,
            flights: SingleFlight::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// TTL used by callers that have no better idea.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.default_ttl_secs)
    }

    fn durable_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Fetch a fresh value, or `None` if absent, expired, or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_inner(key, true)
    }

    fn get_inner<T: DeserializeOwned>(&self, key: &str, record: bool) -> Option<T> {
        let value = self.lookup(key);
        if record {
            let counter = if value.is_some() { &self.hits } else { &self.misses };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        let value = value?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cached value has unexpected shape, ignoring");
                None
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        match self.memory.touch(key, now) {
            Lookup::Hit(value) => return Some(value),
            // An expired memory entry may have a fresher durable copy written
            // by another process; fall through and let the durable read decide.
            Lookup::Expired | Lookup::Missing => {}
        }

        let durable_key = self.durable_key(key);
        match self.durable.read(&durable_key) {
            Ok(Some(mut item)) if !item.is_expired(now) => {
                item.touch(now);
                let value = item.data.clone();
                self.memory.insert(key.to_string(), item);
                self.enforce_capacity();
                Some(value)
            }
            Ok(Some(_)) => {
                self.remove_durable(&durable_key);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(tier = self.durable.name(), key = %durable_key, error = %e, "durable read failed, treating as miss");
                None
            }
        }
    }

    /// Write a value to both tiers.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let value = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "value not serializable, not cached");
                return;
            }
        };
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let item = CacheItem::new(value, self.clock.now_millis(), ttl_ms);

        let durable_key = self.durable_key(key);
        if let Err(e) = self.durable.write(&durable_key, &item) {
            warn!(tier = self.durable.name(), key = %durable_key, error = %e, "durable write failed");
        }
        self.memory.insert(key.to_string(), item);
        self.enforce_capacity();
    }

    /// Remove one key from both tiers.
    pub fn invalidate(&self, key: &str) {
        self.memory.evict(key);
        self.remove_durable(&self.durable_key(key));
    }

    /// Remove every key in this namespace containing `pattern`.
    /// Returns the number of durable entries removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let from_memory = self.memory.remove_matching(pattern);
        let prefix = self.prefix();
        let keys = match self.durable.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(tier = self.durable.name(), error = %e, "durable key listing failed");
                return 0;
            }
        };
        let removed = keys
            .iter()
            .filter(|k| k[prefix.len()..].contains(pattern))
            .filter(|k| self.remove_durable(k))
            .count();
        debug!(namespace = %self.namespace, pattern, from_memory, removed, "pattern invalidation");
        removed
    }

    /// Remove everything in this namespace.
    pub fn clear(&self) {
        self.memory.clear();
        let prefix = self.prefix();
        match self.durable.keys_with_prefix(&prefix) {
            Ok(keys) => {
                for key in keys {
                    self.remove_durable(&key);
                }
            }
            Err(e) => warn!(tier = self.durable.name(), error = %e, "durable key listing failed"),
        }
    }

    /// Return the cached value for `key`, or run `fetcher` once, cache its
    /// result for `ttl`, and return it.
    ///
    /// Concurrent callers on the same key are serialized: the first runs the
    /// fetcher, the rest wait and then read what it stored. Fetch errors are
    /// returned as-is and nothing is cached. Dropping the returned future
    /// cancels the fetch; the next waiter then fetches itself.
    pub async fn get_or_set<T, F, Fut, E>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let _flight = self.flights.acquire(key).await;
        if let Some(value) = self.get_inner(key, false) {
            debug!(namespace = %self.namespace, key, "filled by concurrent fetch");
            return Ok(value);
        }

        let value = fetcher().await?;
        self.set(key, &value, ttl);
        Ok(value)
    }

    /// Remove expired entries from both tiers regardless of access.
    pub fn sweep_expired(&self) -> SweepReport {
        let now = self.clock.now_millis();
        let memory_removed = self.memory.remove_expired(now).len();

        let mut durable_removed = 0;
        match self.durable.keys_with_prefix(&self.prefix()) {
            Ok(keys) => {
                for key in keys {
                    let expired = match self.durable.read(&key) {
                        Ok(Some(item)) => item.is_expired(now),
                        Ok(None) => false,
                        // Corrupt rows can never serve a hit; anything else may be transient.
                        Err(TollgateError::StorageError(StorageError::CorruptEntry { .. })) => true,
                        Err(e) => {
                            warn!(tier = self.durable.name(), key = %key, error = %e, "sweep skipped unreadable entry");
                            false
                        }
                    };
                    if expired && self.remove_durable(&key) {
                        durable_removed += 1;
                    }
                }
            }
            Err(e) => warn!(tier = self.durable.name(), error = %e, "durable key listing failed"),
        }

        let report = SweepReport {
            memory_removed,
            durable_removed,
        };
        if memory_removed + durable_removed > 0 {
            debug!(namespace = %self.namespace, memory_removed, durable_removed, "cache sweep");
        }
        report
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let memory = self.memory.stats(now);

        let mut durable = TierStats::default();
        match self.durable.keys_with_prefix(&self.prefix()) {
            Ok(keys) => {
                for key in keys {
                    if let Ok(Some(item)) = self.durable.read(&key) {
                        tally(&mut durable, &key, &item, now);
                    }
                }
            }
            Err(e) => warn!(tier = self.durable.name(), error = %e, "durable key listing failed"),
        }

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            memory,
            durable,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }

    /// Number of entries resident in the memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Whether `key` is resident in the memory tier (no I/O, no touch).
    pub fn in_memory(&self, key: &str) -> bool {
        self.memory.contains(key)
    }

    fn enforce_capacity(&self) {
        let evicted = self
            .memory
            .evict_lru(self.config.max_memory_items, self.config.eviction_fraction);
        if !evicted.is_empty() {
            debug!(namespace = %self.namespace, evicted = evicted.len(), "memory tier over capacity");
        }
    }

    fn remove_durable(&self, durable_key: &str) -> bool {
        match self.durable.remove(durable_key) {
            Ok(present) => present,
            Err(e) => {
                warn!(tier = self.durable.name(), key = %durable_key, error = %e, "durable remove failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("namespace", &self.namespace)
            .field("memory_items", &self.memory.len())
            .field("durable", &self.durable.name())
            .finish()
    }
}
