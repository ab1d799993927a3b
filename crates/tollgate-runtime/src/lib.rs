//! # tollgate-runtime
//!
//! Builds the governance components from a [`TollgateConfig`] and runs their
//! background housekeeping.
//!
//! [`TollgateConfig`]: tollgate_core::config::TollgateConfig

pub mod context;
pub mod scheduler;
pub mod tracing_setup;

pub use context::GovernanceContext;
pub use scheduler::PeriodicTask;
pub use tracing_setup::init_tracing;
