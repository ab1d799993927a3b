//! Structured log events for governance decisions.
//!
//! Each function emits a `tracing` event with structured fields.

/// A request was turned away by the rate limiter.
pub fn rate_limited(key: &str, retry_after_secs: u64) {
    tracing::info!(
        event = "rate_limited",
        key = %key,
        retry_after_secs,
        "request rate limited"
    );
}

/// A feature check came back denied.
pub fn feature_denied(feature_id: &str, requires_upgrade: bool) {
    tracing::info!(
        event = "feature_denied",
        feature_id = %feature_id,
        requires_upgrade,
        "feature access denied"
    );
}

/// A cache sweep finished.
pub fn cache_swept(memory_removed: usize, durable_removed: usize) {
    tracing::debug!(
        event = "cache_swept",
        memory_removed,
        durable_removed,
        "cache sweep completed"
    );
}

/// A rate-limiter cleanup finished.
pub fn limiter_cleaned(removed: usize, tracked: usize) {
    tracing::debug!(
        event = "limiter_cleaned",
        removed,
        tracked,
        "rate limiter cleanup completed"
    );
}

/// Background tasks were started or stopped.
pub fn lifecycle(state: &str, tasks: usize) {
    tracing::info!(event = "lifecycle", state = %state, tasks, "governance context {state}");
}
