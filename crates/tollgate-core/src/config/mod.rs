pub mod cache_config;
pub mod defaults;
pub mod license_config;
pub mod observability_config;
pub mod rate_limit_config;

pub use cache_config::CacheConfig;
pub use license_config::LicenseConfig;
pub use observability_config::ObservabilityConfig;
pub use rate_limit_config::RateLimitConfig;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_REFRESH_THRESHOLD_HOURS;
use crate::errors::{TollgateError, TollgateResult};

/// Top-level configuration. Every section falls back to its defaults, so an
/// empty document is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub license: LicenseConfig,
    pub observability: ObservabilityConfig,
}

impl TollgateConfig {
    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> TollgateResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| TollgateError::ConfigError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &std::path::Path) -> TollgateResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| TollgateError::ConfigError {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&source)
    }

    /// Reject values the components cannot operate with.
    pub fn validate(&self) -> TollgateResult<()> {
        if self.cache.max_memory_items == 0 {
            return Err(config_err("cache.max_memory_items must be at least 1"));
        }
        if !(self.cache.eviction_fraction > 0.0 && self.cache.eviction_fraction <= 1.0) {
            return Err(config_err("cache.eviction_fraction must be in (0, 1]"));
        }
        if self.cache.sweep_interval_secs == 0 || self.rate_limit.cleanup_interval_secs == 0 {
            return Err(config_err("sweep intervals must be non-zero"));
        }
        if self.rate_limit.default_burst_allowance < 1.0 {
            return Err(config_err("rate_limit.default_burst_allowance must be >= 1.0"));
        }
        if !(0..=MAX_REFRESH_THRESHOLD_HOURS).contains(&self.license.refresh_threshold_hours) {
            return Err(config_err(
                "license.refresh_threshold_hours must be between 0 and 8760",
            ));
        }
        if self.license.offline_token_hours == 0 {
            return Err(config_err("license.offline_token_hours must be non-zero"));
        }
        Ok(())
    }
}

fn config_err(reason: &str) -> TollgateError {
    TollgateError::ConfigError {
        reason: reason.to_string(),
    }
}
