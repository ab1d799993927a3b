use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::LicenseError;
use crate::models::PlanLimits;

/// Payload of an offline token: the subset of a validated license needed to
/// keep gating features while the backend is unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineToken {
    pub user_id: String,
    pub plan_id: String,
    pub features: BTreeSet<String>,
    pub limits: PlanLimits,
    pub extension_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Wire envelope. `data` is the JSON-encoded [`OfflineToken`] kept as a
/// string so the checksum covers the exact bytes that were hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub data: String,
    pub checksum: String,
}

/// Outcome of validating an offline token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValidation {
    pub is_valid: bool,
    pub data: Option<OfflineToken>,
    pub error: Option<LicenseError>,
}

impl TokenValidation {
    pub fn valid(data: OfflineToken) -> Self {
        Self {
            is_valid: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn invalid(error: LicenseError) -> Self {
        Self {
            is_valid: false,
            data: None,
            error: Some(error),
        }
    }
}
