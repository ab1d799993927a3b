use serde::{Deserialize, Serialize};

use super::defaults;

/// License governor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Id of the running extension. Licenses and offline tokens bound to a
    /// different id are rejected.
    pub extension_id: String,
    /// Key material mixed into offline-token checksums.
    pub key_material: String,
    /// Default offline token lifetime (hours).
    pub offline_token_hours: u32,
    /// Refresh when fewer than this many hours remain.
    pub refresh_threshold_hours: i64,
    /// Upper bound on how long a validated license stays cached (seconds).
    pub license_cache_ttl_secs: u64,
    /// How long usage records are retained (days).
    pub usage_ttl_days: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            extension_id: defaults::DEFAULT_EXTENSION_ID.to_string(),
            key_material: defaults::DEFAULT_KEY_MATERIAL.to_string(),
            offline_token_hours: defaults::DEFAULT_OFFLINE_TOKEN_HOURS,
            refresh_threshold_hours: defaults::DEFAULT_REFRESH_THRESHOLD_HOURS,
            license_cache_ttl_secs: defaults::DEFAULT_LICENSE_CACHE_TTL_SECS,
            usage_ttl_days: defaults::DEFAULT_USAGE_TTL_DAYS,
        }
    }
}
