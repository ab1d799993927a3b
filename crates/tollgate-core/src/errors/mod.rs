mod license_error;
mod storage_error;

pub use license_error::LicenseError;
pub use storage_error::StorageError;

/// Result alias used across the workspace.
pub type TollgateResult<T> = Result<T, TollgateError>;

/// Umbrella error for everything that can be returned as `Err`.
///
/// Access checks and token validation report failures as data; only the
/// fail-fast entry points (`require_feature_access`, guarded fetches) and
/// infrastructure code return these.
#[derive(Debug, thiserror::Error)]
pub enum TollgateError {
    #[error("license error: {0}")]
    LicenseError(#[from] LicenseError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("feature not available: {feature_id}")]
    FeatureNotAvailable {
        feature_id: String,
        requires_upgrade: bool,
    },

    #[error("rate limit exceeded for {key}: retry after {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: u64 },

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("fetch failed: {reason}")]
    FetchFailed { reason: String },
}

impl TollgateError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LicenseError(e) => e.code(),
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::FeatureNotAvailable { .. } => "FEATURE_NOT_AVAILABLE",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::FetchFailed { .. } => "FETCH_FAILED",
        }
    }

    /// Human-readable message suitable for display to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::LicenseError(e) => e.user_message().to_string(),
            Self::FeatureNotAvailable {
                feature_id,
                requires_upgrade: true,
            } => format!("\"{feature_id}\" is not included in your plan. Upgrade to unlock it."),
            Self::FeatureNotAvailable { feature_id, .. } => {
                format!("\"{feature_id}\" is not available right now.")
            }
            Self::RateLimited {
                retry_after_secs, ..
            } => format!("Too many requests. Please try again in {retry_after_secs} seconds."),
            Self::FetchFailed { .. } => {
                "The service could not be reached. Please try again later.".to_string()
            }
            Self::StorageError(_) | Self::ConfigError { .. } | Self::SerializationError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
