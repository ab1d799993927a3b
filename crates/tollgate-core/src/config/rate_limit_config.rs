use serde::{Deserialize, Serialize};

use super::defaults;

/// Rate limiter housekeeping configuration. Per-call limits are chosen by
/// the caller, not configured here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Interval between stale-key sweeps (seconds).
    pub cleanup_interval_secs: u64,
    /// Keys with no request inside this window are dropped (seconds).
    pub retention_secs: u64,
    /// Burst multiplier used when the caller does not pass one.
    pub default_burst_allowance: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: defaults::DEFAULT_RATE_LIMIT_CLEANUP_INTERVAL_SECS,
            retention_secs: defaults::DEFAULT_RATE_LIMIT_RETENTION_SECS,
            default_burst_allowance: defaults::DEFAULT_BURST_ALLOWANCE,
        }
    }
}
