use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNLIMITED;
use crate::errors::LicenseError;
use crate::models::FeatureId;

/// Quotas and flags granted by a plan. `-1` on a counter means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanLimits {
    pub ai_requests: i64,
    pub conversations: i64,
    pub file_uploads: i64,
    pub custom_prompts: i64,
    pub priority_support: bool,
    pub advanced_features: BTreeSet<String>,
}

impl PlanLimits {
    /// Limits with every counter unlimited and priority support on.
    pub fn unlimited() -> Self {
        Self {
            ai_requests: UNLIMITED,
            conversations: UNLIMITED,
            file_uploads: UNLIMITED,
            custom_prompts: UNLIMITED,
            priority_support: true,
            advanced_features: BTreeSet::new(),
        }
    }

    /// Counter limit for a quota feature, `None` for non-counter features.
    pub fn limit_for(&self, feature: &FeatureId) -> Option<i64> {
        match feature {
            FeatureId::AiRequests => Some(self.ai_requests),
            FeatureId::Conversations => Some(self.conversations),
            FeatureId::FileUploads => Some(self.file_uploads),
            FeatureId::CustomPrompts => Some(self.custom_prompts),
            FeatureId::PrioritySupport | FeatureId::Advanced(_) => None,
        }
    }
}

/// A license as delivered by the backend. Never mutated after validation;
/// a refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub user_id: String,
    pub plan_id: String,
    pub is_valid: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub limits: PlanLimits,
    /// JWT-shaped signed token issued by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl License {
    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.features.contains(feature_id)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry; negative once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

/// Outcome of validating a license. Failures are data, not `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseValidation {
    pub is_valid: bool,
    pub license: Option<License>,
    pub error: Option<LicenseError>,
}

impl LicenseValidation {
    pub fn valid(license: License) -> Self {
        Self {
            is_valid: true,
            license: Some(license),
            error: None,
        }
    }

    pub fn invalid(error: LicenseError) -> Self {
        Self {
            is_valid: false,
            license: None,
            error: Some(error),
        }
    }

    /// The error string surfaced to callers, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }
}
