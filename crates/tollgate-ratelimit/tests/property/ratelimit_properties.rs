use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use proptest::prelude::*;

use tollgate_core::clock::ManualClock;
use tollgate_core::IClock;
use tollgate_core::config::RateLimitConfig;
use tollgate_ratelimit::{adaptive_max, RateLimiter};

fn setup() -> (RateLimiter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    (RateLimiter::new(clock.clone(), RateLimitConfig::default()), clock)
}

proptest! {
    #[test]
    fn never_admits_more_than_max_per_window(
        max in 0u32..30,
        window_secs in 1u64..120,
        gaps_ms in prop::collection::vec(0i64..5_000, 1..150),
    ) {
        let (limiter, clock) = setup();
        let window = Duration::from_secs(window_secs);
        let window_ms = (window_secs * 1000) as i64;
        let mut admitted: Vec<i64> = Vec::new();
        for gap in gaps_ms {
            clock.advance(ChronoDuration::milliseconds(gap));
            let now = clock.now_millis();
            if limiter.check_rate_limit("k", max, window).allowed {
                admitted.push(now);
            }
            let in_window = admitted.iter().filter(|&&t| t > now - window_ms).count();
            prop_assert!(in_window <= max as usize);
        }
    }

    #[test]
    fn rejection_always_carries_retry_after(
        max in 1u32..10,
        window_secs in 1u64..60,
    ) {
        let (limiter, _) = setup();
        let window = Duration::from_secs(window_secs);
        for _ in 0..max {
            limiter.check_rate_limit("k", max, window);
        }
        let result = limiter.check_rate_limit("k", max, window);
        prop_assert!(!result.allowed);
        prop_assert_eq!(result.remaining, 0);
        prop_assert!(result.retry_after.is_some_and(|s| s >= 1 && s <= window_secs));
    }

    #[test]
    fn adaptive_max_never_exceeds_base(base in 0u32..10_000, rate in 0.0f64..1.0) {
        let scaled = adaptive_max(base, rate);
        prop_assert!(scaled <= base);
        if base > 0 {
            prop_assert!(scaled >= 1);
        }
    }
}
