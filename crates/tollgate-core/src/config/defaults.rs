//! Default values for every config field.

pub const DEFAULT_MAX_MEMORY_ITEMS: usize = crate::constants::DEFAULT_MAX_MEMORY_ITEMS;
pub const DEFAULT_EVICTION_FRACTION: f64 = crate::constants::DEFAULT_EVICTION_FRACTION;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_RETENTION_SECS: u64 = 86_400;
pub const DEFAULT_BURST_ALLOWANCE: f64 = crate::constants::DEFAULT_BURST_ALLOWANCE;

pub const DEFAULT_EXTENSION_ID: &str = "tollgate-dev-extension";
pub const DEFAULT_KEY_MATERIAL: &str = "tollgate-dev-public-key";
pub const DEFAULT_OFFLINE_TOKEN_HOURS: u32 = crate::constants::DEFAULT_OFFLINE_TOKEN_HOURS;
pub const DEFAULT_REFRESH_THRESHOLD_HOURS: i64 = crate::constants::DEFAULT_REFRESH_THRESHOLD_HOURS;
pub const DEFAULT_LICENSE_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_USAGE_TTL_DAYS: u64 = 62;

pub const DEFAULT_LOG_LEVEL: &str = "info";
