//! In-process tier backed by `DashMap`.
//!
//! Serves as the fast tier of every `CacheStore`, and doubles as an
//! in-memory durable tier for tests and for deployments without a disk.

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use tollgate_core::errors::TollgateResult;
use tollgate_core::models::{CacheItem, TierStats};
use tollgate_core::traits::ICacheTier;

/// Result of a touching lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(Value),
    /// Present but past its TTL; already removed.
    Expired,
    Missing,
}

/// Concurrent in-memory tier.
#[derive(Debug, Default)]
pub struct MemoryTier {
    items: DashMap<String, CacheItem<Value>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key and record the access. Expired entries are removed.
    pub fn touch(&self, key: &str, now: i64) -> Lookup {
        let Some(mut entry) = self.items.get_mut(key) else {
            return Lookup::Missing;
        };
        if entry.is_expired(now) {
            drop(entry);
            self.items.remove(key);
            return Lookup::Expired;
        }
        entry.touch(now);
        Lookup::Hit(entry.data.clone())
    }

    pub fn insert(&self, key: String, item: CacheItem<Value>) {
        self.items.insert(key, item);
    }

    /// Drop one key. Returns whether it was resident.
    pub fn evict(&self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Drop the least-recently-accessed entries once `len > capacity`.
    ///
    /// Removes `fraction` of the resident entries, or more if that would
    /// still leave the tier over capacity. Returns the evicted keys.
    pub fn evict_lru(&self, capacity: usize, fraction: f64) -> Vec<String> {
        let len = self.items.len();
        if len <= capacity {
            return Vec::new();
        }

        let by_fraction = (len as f64 * fraction).floor() as usize;
        let count = by_fraction.max(len - capacity).min(len);

        let mut candidates: Vec<(i64, u64, String)> = self
            .items
            .iter()
            .map(|e| (e.last_accessed, e.access_count, e.key().clone()))
            .collect();
        candidates.sort_unstable();

        let victims: Vec<String> = candidates
            .into_iter()
            .take(count)
            .map(|(_, _, key)| key)
            .collect();
        for key in &victims {
            self.items.remove(key);
        }
        debug!(evicted = victims.len(), remaining = self.items.len(), "memory tier eviction");
        victims
    }

    /// Remove every expired entry. Returns the removed keys.
    pub fn remove_expired(&self, now: i64) -> Vec<String> {
        let mut removed = Vec::new();
        self.items.retain(|key, item| {
            if item.is_expired(now) {
                removed.push(key.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove every key containing `pattern`. Returns how many went.
    pub fn remove_matching(&self, pattern: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|key, _| !key.contains(pattern));
        before.saturating_sub(self.items.len())
    }

    pub fn stats(&self, now: i64) -> TierStats {
        let mut stats = TierStats::default();
        for entry in self.items.iter() {
            tally(&mut stats, entry.key(), entry.value(), now);
        }
        stats
    }

    pub fn clear(&self) {
        self.items.clear();
    }
}

/// Add one entry to a tier tally.
pub(crate) fn tally(stats: &mut TierStats, key: &str, item: &CacheItem<Value>, now: i64) {
    stats.items += 1;
    if item.is_expired(now) {
        stats.expired += 1;
    } else {
        stats.valid += 1;
    }
    stats.approximate_bytes += key.len() + item.data.to_string().len();
}

impl ICacheTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self, key: &str) -> TollgateResult<Option<CacheItem<Value>>> {
        Ok(self.items.get(key).map(|e| e.value().clone()))
    }

    fn write(&self, key: &str, item: &CacheItem<Value>) -> TollgateResult<()> {
        self.items.insert(key.to_string(), item.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> TollgateResult<bool> {
        Ok(self.items.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> TollgateResult<Vec<String>> {
        Ok(self
            .items
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(now: i64, ttl: u64) -> CacheItem<Value> {
        CacheItem::new(json!("v"), now, ttl)
    }

    #[test]
    fn touch_hits_and_counts_access() {
        let tier = MemoryTier::new();
        tier.insert("k".into(), item(0, 1_000));
        assert_eq!(tier.touch("k", 10), Lookup::Hit(json!("v")));
        let stored = tier.read("k").unwrap().unwrap();
        assert_eq!(stored.access_count, 1);
        assert_eq!(stored.last_accessed, 10);
    }

    #[test]
    fn touch_removes_expired() {
        let tier = MemoryTier::new();
        tier.insert("k".into(), item(0, 100));
        assert_eq!(tier.touch("k", 101), Lookup::Expired);
        assert!(!tier.contains("k"));
        assert_eq!(tier.touch("k", 102), Lookup::Missing);
    }

    #[test]
    fn eviction_drops_oldest_fifth() {
        let tier = MemoryTier::new();
        for i in 0..11 {
            tier.insert(format!("k{i}"), item(i, 10_000));
        }
        let evicted = tier.evict_lru(10, 0.2);
        // 20% of 11 floors to 2, which already brings us under capacity.
        assert_eq!(evicted, vec!["k0".to_string(), "k1".to_string()]);
        assert_eq!(tier.len(), 9);
    }

    #[test]
    fn eviction_is_noop_under_capacity() {
        let tier = MemoryTier::new();
        tier.insert("a".into(), item(0, 10));
        assert!(tier.evict_lru(1, 0.2).is_empty());
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn remove_expired_keeps_fresh() {
        let tier = MemoryTier::new();
        tier.insert("old".into(), item(0, 10));
        tier.insert("new".into(), item(50, 10));
        let removed = tier.remove_expired(55);
        assert_eq!(removed, vec!["old".to_string()]);
        assert!(tier.contains("new"));
    }

    #[test]
    fn remove_matching_uses_substring() {
        let tier = MemoryTier::new();
        tier.insert("definition:apple".into(), item(0, 10));
        tier.insert("definition:pear".into(), item(0, 10));
        tier.insert("translation:apple".into(), item(0, 10));
        assert_eq!(tier.remove_matching("apple"), 2);
        assert!(tier.contains("definition:pear"));
    }
}
