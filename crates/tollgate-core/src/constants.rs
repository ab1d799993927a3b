/// Tollgate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default fast-tier capacity (items).
pub const DEFAULT_MAX_MEMORY_ITEMS: usize = 1000;

/// Fraction of the fast tier evicted when capacity is exceeded.
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.2;

/// Namespace prefix for general-purpose cached values in the durable tier.
pub const CACHE_NAMESPACE: &str = "cache";

/// Namespace prefix for license and usage records in the durable tier.
pub const GOVERNOR_NAMESPACE: &str = "governor";

/// Logical key of the cached license inside the governor namespace.
pub const LICENSE_KEY: &str = "license";

/// Logical key prefix of usage records inside the governor namespace.
pub const USAGE_KEY_PREFIX: &str = "usage";

/// Default burst allowance multiplier.
pub const DEFAULT_BURST_ALLOWANCE: f64 = 1.5;

/// Error-rate thresholds for adaptive rate limiting.
pub const ADAPTIVE_SEVERE_ERROR_RATE: f64 = 0.10;
pub const ADAPTIVE_ELEVATED_ERROR_RATE: f64 = 0.05;

/// Default lifetime of an offline token.
pub const DEFAULT_OFFLINE_TOKEN_HOURS: u32 = 72;

/// A license with less than this many hours left should be refreshed.
pub const DEFAULT_REFRESH_THRESHOLD_HOURS: i64 = 24;

/// Largest accepted refresh threshold (one year).
pub const MAX_REFRESH_THRESHOLD_HOURS: i64 = 24 * 365;

/// Plan limit value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Marker carried in every offline token payload.
pub const OFFLINE_TOKEN_TYPE: &str = "offline";

/// Current `UsageRecord` schema version.
pub const USAGE_SCHEMA_VERSION: u32 = 1;
