use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A named limit callers can keep next to the operation it guards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub max_requests: u32,
    #[serde(with = "window_millis")]
    pub window: Duration,
    /// When set, requests are checked against a burst sub-window first.
    #[serde(default)]
    pub burst_allowance: Option<f64>,
}

impl RateLimitRule {
    pub const fn per_window(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            burst_allowance: None,
        }
    }

    pub const fn per_minute(max_requests: u32) -> Self {
        Self::per_window(max_requests, Duration::from_secs(60))
    }

    pub fn with_burst(mut self, allowance: f64) -> Self {
        self.burst_allowance = Some(allowance);
        self
    }
}

mod window_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
