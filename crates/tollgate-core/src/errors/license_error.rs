/// License and offline-token validation failures.
///
/// The `Display` strings are the messages surfaced to callers verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum LicenseError {
    #[error("No license found")]
    NotFound,

    #[error("Invalid license format")]
    InvalidFormat,

    #[error("Invalid license signature")]
    InvalidSignature,

    #[error("License expired")]
    Expired,

    #[error("License token expired")]
    TokenExpired,

    #[error("License not valid for this extension")]
    ExtensionMismatch,

    #[error("License user mismatch")]
    UserMismatch,

    #[error("Token integrity check failed")]
    IntegrityCheckFailed,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Offline token expired")]
    OfflineTokenExpired,
}

impl LicenseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NO_LICENSE",
            Self::InvalidFormat => "INVALID_LICENSE_FORMAT",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Expired => "LICENSE_EXPIRED",
            Self::TokenExpired => "LICENSE_TOKEN_EXPIRED",
            Self::ExtensionMismatch => "EXTENSION_MISMATCH",
            Self::UserMismatch => "USER_MISMATCH",
            Self::IntegrityCheckFailed => "TOKEN_INTEGRITY_FAILED",
            Self::InvalidTokenFormat => "INVALID_TOKEN_FORMAT",
            Self::OfflineTokenExpired => "OFFLINE_TOKEN_EXPIRED",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound => "No active subscription was found. Sign in to restore your plan.",
            Self::Expired | Self::TokenExpired => {
                "Your subscription has expired. Renew it to keep using premium features."
            }
            Self::OfflineTokenExpired => {
                "Offline access has expired. Reconnect to the internet to continue."
            }
            Self::ExtensionMismatch | Self::UserMismatch => {
                "This license belongs to a different account or installation."
            }
            Self::InvalidFormat
            | Self::InvalidSignature
            | Self::IntegrityCheckFailed
            | Self::InvalidTokenFormat => {
                "Your license could not be verified. Sign in again to refresh it."
            }
        }
    }
}
