//! Span constructors for governance operations.

use tracing::Span;

/// Span around a feature-access decision.
pub fn license_check(feature_id: &str) -> Span {
    tracing::info_span!("license.check", feature_id = %feature_id)
}

/// Span around a guarded, cached outbound fetch.
pub fn cache_fetch(cache_key: &str) -> Span {
    tracing::info_span!("cache.fetch", cache_key = %cache_key)
}

/// Span around one run of a periodic sweep.
pub fn sweep(task: &'static str) -> Span {
    tracing::debug_span!("sweep", task)
}
