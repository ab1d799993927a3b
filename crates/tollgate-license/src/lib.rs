//! # tollgate-license
//!
//! Decides whether the current user may use a feature.
//!
//! - [`LicenseGovernor`] validates licenses, answers feature-access checks,
//!   and issues and verifies offline tokens.
//! - [`UsageTracker`] keeps per-period usage counters in the governor store.
//! - [`signature`] decodes the JWT-shaped license signature.

pub mod governor;
pub mod offline;
pub mod signature;
pub mod usage;

pub use governor::LicenseGovernor;
pub use signature::{decode_signature, SignatureClaims};
pub use usage::UsageTracker;
