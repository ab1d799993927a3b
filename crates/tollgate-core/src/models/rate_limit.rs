use serde::{Deserialize, Serialize};

/// Admission decision from the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests still admissible in the current window.
    pub remaining: u32,
    /// Unix millis at which the oldest counted request leaves the window.
    pub reset_time: i64,
    /// Seconds to wait before retrying; set only on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}
