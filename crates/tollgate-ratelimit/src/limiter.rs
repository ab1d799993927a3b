//! RateLimiter: sliding-window admission over per-key timestamp lists.
//!
//! Each key owns an ordered list of admitted request times (Unix millis).
//! Entries at or before `now - window` are pruned lazily on every check, so
//! after a check the list only holds timestamps inside the window. Burst
//! sub-windows live in their own map so no caller key can alias them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use tollgate_core::clock::IClock;
use tollgate_core::config::RateLimitConfig;
use tollgate_core::models::RateLimitResult;

use crate::adaptive::adaptive_max;
use crate::rule::RateLimitRule;

/// Thread-safe sliding-window rate limiter.
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<i64>>,
    bursts: DashMap<String, VecDeque<i64>>,
    clock: Arc<dyn IClock>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn IClock>, config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            bursts: DashMap::new(),
            clock,
            config,
        }
    }

    /// Admit or reject one request for `key`.
    pub fn check_rate_limit(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitResult {
        let now = self.clock.now_millis();
        admit(&self.windows, key, max_requests, window_ms(window), now)
    }

    /// Like [`check_rate_limit`](Self::check_rate_limit), with `base_max`
    /// scaled down by the downstream error rate.
    pub fn check_adaptive_rate_limit(
        &self,
        key: &str,
        base_max: u32,
        window: Duration,
        error_rate: f64,
    ) -> RateLimitResult {
        let max = adaptive_max(base_max, error_rate);
        if max != base_max {
            debug!(key, base_max, max, error_rate, "adaptive limit scaled down");
        }
        self.check_rate_limit(key, max, window)
    }

    /// Check a quarter-length burst window first, then the full window.
    ///
    /// The burst window admits `floor(max * allowance / 4)` requests, at least
    /// one when `max_requests > 0`, so short spikes above the average rate
    /// pass while sustained ones do not. Both checks must pass. `None` uses
    /// the configured default allowance.
    pub fn check_burst_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        burst_allowance: Option<f64>,
    ) -> RateLimitResult {
        let now = self.clock.now_millis();
        let allowance = burst_allowance.unwrap_or(self.config.default_burst_allowance);
        let full_ms = window_ms(window);
        let burst_max = burst_max(max_requests, allowance);

        let burst = admit(&self.bursts, key, burst_max, full_ms / 4, now);
        if !burst.allowed {
            debug!(key, burst_max, "burst window exhausted");
            return burst;
        }
        admit(&self.windows, key, max_requests, full_ms, now)
    }

    /// Check a request against a [`RateLimitRule`].
    pub fn check_rule(&self, key: &str, rule: &RateLimitRule) -> RateLimitResult {
        match rule.burst_allowance {
            Some(allowance) => {
                self.check_burst_rate_limit(key, rule.max_requests, rule.window, Some(allowance))
            }
            None => self.check_rate_limit(key, rule.max_requests, rule.window),
        }
    }

    /// What a check would return right now, without recording a request.
    pub fn status(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitResult {
        let now = self.clock.now_millis();
        let window_ms = window_ms(window);
        let cutoff = now - window_ms;
        let (count, oldest) = self
            .windows
            .get(key)
            .map(|w| {
                let live: Vec<i64> = w.iter().copied().filter(|&t| t > cutoff).collect();
                (live.len(), live.first().copied())
            })
            .unwrap_or((0, None));
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        let oldest = oldest.unwrap_or(now);
        if count < max_requests {
            RateLimitResult {
                allowed: true,
                remaining: max_requests - count,
                reset_time: oldest + window_ms,
                retry_after: None,
            }
        } else {
            rejected(oldest, window_ms, now)
        }
    }

    /// Forget all state for `key`, including its burst window.
    pub fn reset_rate_limit(&self, key: &str) {
        self.windows.remove(key);
        self.bursts.remove(key);
    }

    /// Drop keys with no request inside the retention window. Returns how
    /// many keys were dropped.
    pub fn cleanup(&self) -> usize {
        let retention_ms = i64::try_from(self.config.retention_secs.saturating_mul(1000))
            .unwrap_or(i64::MAX);
        let cutoff = self.clock.now_millis().saturating_sub(retention_ms);
        let before = self.tracked_keys();
        for map in [&self.windows, &self.bursts] {
            map.retain(|_, stamps| stamps.back().is_some_and(|&t| t > cutoff));
        }
        let removed = before.saturating_sub(self.tracked_keys());
        if removed > 0 {
            debug!(removed, remaining = self.tracked_keys(), "rate limiter cleanup");
        }
        removed
    }

    /// Number of full and burst windows currently holding state.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len() + self.bursts.len()
    }
}

/// Burst sub-window capacity. Never zero for a non-zero budget, so the
/// burst check cannot lock out a key the full window would admit.
fn burst_max(max_requests: u32, allowance: f64) -> u32 {
    let scaled = (f64::from(max_requests) * allowance / 4.0).floor() as u32;
    if max_requests == 0 {
        0
    } else {
        scaled.max(1)
    }
}

fn admit(
    windows: &DashMap<String, VecDeque<i64>>,
    key: &str,
    max_requests: u32,
    window_ms: i64,
    now: i64,
) -> RateLimitResult {
    let mut stamps = windows.entry(key.to_string()).or_default();
    let cutoff = now - window_ms;
    while stamps.front().is_some_and(|&t| t <= cutoff) {
        stamps.pop_front();
    }

    let count = u32::try_from(stamps.len()).unwrap_or(u32::MAX);
    if count < max_requests {
        stamps.push_back(now);
        let oldest = stamps.front().copied().unwrap_or(now);
        RateLimitResult {
            allowed: true,
            remaining: max_requests - count - 1,
            reset_time: oldest + window_ms,
            retry_after: None,
        }
    } else {
        let oldest = stamps.front().copied().unwrap_or(now);
        drop(stamps);
        debug!(key, max_requests, "rate limit exceeded");
        rejected(oldest, window_ms, now)
    }
}

fn rejected(oldest: i64, window_ms: i64, now: i64) -> RateLimitResult {
    let reset_time = oldest + window_ms;
    let wait_ms = u64::try_from((reset_time - now).max(0)).unwrap_or(0);
    RateLimitResult {
        allowed: false,
        remaining: 0,
        reset_time,
        retry_after: Some(wait_ms.div_ceil(1000)),
    }
}

fn window_ms(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tracked_keys", &self.windows.len())
            .field("config", &self.config)
            .finish()
    }
}
