use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::USAGE_SCHEMA_VERSION;
use crate::models::FeatureId;

/// Usage counters for one billing period.
///
/// The four metered features have dedicated fields; anything else lands in
/// `other`, keyed by its feature id string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Billing period, `YYYY-MM`.
    pub period: String,
    #[serde(default)]
    pub ai_requests: u64,
    #[serde(default)]
    pub conversations: u64,
    #[serde(default)]
    pub file_uploads: u64,
    #[serde(default)]
    pub custom_prompts: u64,
    #[serde(default)]
    pub other: BTreeMap<String, u64>,
}

fn default_version() -> u32 {
    USAGE_SCHEMA_VERSION
}

impl UsageRecord {
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            version: USAGE_SCHEMA_VERSION,
            period: period.into(),
            ai_requests: 0,
            conversations: 0,
            file_uploads: 0,
            custom_prompts: 0,
            other: BTreeMap::new(),
        }
    }

    /// Units consumed for a feature in this period.
    pub fn used(&self, feature: &FeatureId) -> u64 {
        match feature {
            FeatureId::AiRequests => self.ai_requests,
            FeatureId::Conversations => self.conversations,
            FeatureId::FileUploads => self.file_uploads,
            FeatureId::CustomPrompts => self.custom_prompts,
            other => self.other.get(other.as_str()).copied().unwrap_or(0),
        }
    }

    /// Add `amount` units to a feature's counter. Saturates instead of wrapping.
    pub fn increment(&mut self, feature: &FeatureId, amount: u64) {
        let slot = match feature {
            FeatureId::AiRequests => &mut self.ai_requests,
            FeatureId::Conversations => &mut self.conversations,
            FeatureId::FileUploads => &mut self.file_uploads,
            FeatureId::CustomPrompts => &mut self.custom_prompts,
            other => self.other.entry(other.as_str().to_string()).or_insert(0),
        };
        *slot = slot.saturating_add(amount);
    }
}

/// Billing period containing `now` (calendar month, UTC).
pub fn billing_period(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Start of the billing period after the one containing `now`.
pub fn period_reset_date(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
