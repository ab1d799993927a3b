use serde::{Deserialize, Serialize};

use super::defaults;

/// Two-tier cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Fast-tier capacity before eviction kicks in.
    pub max_memory_items: usize,
    /// Share of the fast tier dropped per eviction pass.
    pub eviction_fraction: f64,
    /// TTL applied when a caller does not pick one (seconds).
    pub default_ttl_secs: u64,
    /// Interval between background expiry sweeps (seconds).
    pub sweep_interval_secs: u64,
    /// SQLite file backing the durable tier. `None` keeps it in memory.
    pub durable_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_items: defaults::DEFAULT_MAX_MEMORY_ITEMS,
            eviction_fraction: defaults::DEFAULT_EVICTION_FRACTION,
            default_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            sweep_interval_secs: defaults::DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            durable_path: None,
        }
    }
}
