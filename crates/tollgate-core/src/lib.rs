//! # tollgate-core
//!
//! Foundation crate for the Tollgate governance layer.
//! Defines the license, usage, cache and rate-limit types, the tier and
//! license-source traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use clock::{IClock, ManualClock, SystemClock};
pub use config::TollgateConfig;
pub use errors::{LicenseError, StorageError, TollgateError, TollgateResult};
pub use models::{FeatureAccess, FeatureId, License, PlanLimits, UsageRecord};
