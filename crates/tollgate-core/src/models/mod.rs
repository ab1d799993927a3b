mod cache_item;
mod feature;
mod license;
mod offline_token;
mod rate_limit;
mod usage;

pub use cache_item::{CacheItem, CacheStats, TierStats};
pub use feature::{FeatureAccess, FeatureId};
pub use license::{License, LicenseValidation, PlanLimits};
pub use offline_token::{OfflineToken, TokenEnvelope, TokenValidation};
pub use rate_limit::RateLimitResult;
pub use usage::{billing_period, period_reset_date, UsageRecord};
