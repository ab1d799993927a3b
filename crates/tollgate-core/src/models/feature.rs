use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature identifiers understood by the governor. Anything outside the
/// fixed vocabulary is an advanced feature looked up in
/// `PlanLimits::advanced_features`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureId {
    AiRequests,
    Conversations,
    FileUploads,
    CustomPrompts,
    PrioritySupport,
    Advanced(String),
}

impl FeatureId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AiRequests => "ai_requests",
            Self::Conversations => "conversations",
            Self::FileUploads => "file_uploads",
            Self::CustomPrompts => "custom_prompts",
            Self::PrioritySupport => "priority_support",
            Self::Advanced(name) => name,
        }
    }

    /// Whether access is decided by a usage counter.
    pub fn is_metered(&self) -> bool {
        matches!(
            self,
            Self::AiRequests | Self::Conversations | Self::FileUploads | Self::CustomPrompts
        )
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        match s {
            "ai_requests" => Self::AiRequests,
            "conversations" => Self::Conversations,
            "file_uploads" => Self::FileUploads,
            "custom_prompts" => Self::CustomPrompts,
            "priority_support" => Self::PrioritySupport,
            other => Self::Advanced(other.to_string()),
        }
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<FeatureId> for String {
    fn from(f: FeatureId) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access decision for one feature. Derived on every check, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
    pub feature_id: String,
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_date: Option<DateTime<Utc>>,
    pub requires_upgrade: bool,
}

impl FeatureAccess {
    /// Denied, upgrade required, no quota details.
    pub fn denied(feature_id: &str) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            has_access: false,
            limit: None,
            used: None,
            reset_date: None,
            requires_upgrade: true,
        }
    }

    /// Decision for a boolean feature flag.
    pub fn flag(feature_id: &str, granted: bool) -> Self {
        Self {
            has_access: granted,
            requires_upgrade: !granted,
            ..Self::denied(feature_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_parse_to_variants() {
        assert_eq!(FeatureId::from("ai_requests"), FeatureId::AiRequests);
        assert_eq!(FeatureId::from("priority_support"), FeatureId::PrioritySupport);
        assert_eq!(
            FeatureId::from("analytics"),
            FeatureId::Advanced("analytics".into())
        );
    }

    #[test]
    fn display_matches_wire_string() {
        for id in ["ai_requests", "conversations", "file_uploads", "custom_prompts", "team"] {
            assert_eq!(FeatureId::from(id).to_string(), id);
        }
    }

    #[test]
    fn feature_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&FeatureId::FileUploads).unwrap();
        assert_eq!(json, "\"file_uploads\"");
    }
}
