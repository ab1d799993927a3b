//! Throughput scaling by downstream health.

use tollgate_core::constants::{ADAPTIVE_ELEVATED_ERROR_RATE, ADAPTIVE_SEVERE_ERROR_RATE};

/// Scale `base_max` down when the downstream error rate is high:
/// halved above 10%, three quarters above 5%, unchanged otherwise.
/// A non-zero base never scales below 1.
pub fn adaptive_max(base_max: u32, error_rate: f64) -> u32 {
    let factor = if error_rate > ADAPTIVE_SEVERE_ERROR_RATE {
        0.5
    } else if error_rate > ADAPTIVE_ELEVATED_ERROR_RATE {
        0.75
    } else {
        1.0
    };
    let scaled = (f64::from(base_max) * factor).floor() as u32;
    if base_max == 0 {
        0
    } else {
        scaled.max(1)
    }
}
