//! # tollgate-ratelimit
//!
//! Sliding-window admission control keyed by caller-chosen strings.
//! Purely in-memory and synchronous; never fails. A rejected result carries
//! `retry_after` for the caller to surface.

pub mod adaptive;
pub mod limiter;
pub mod rule;

pub use adaptive::adaptive_max;
pub use limiter::RateLimiter;
pub use rule::RateLimitRule;
