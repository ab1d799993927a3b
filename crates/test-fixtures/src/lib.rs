//! Shared test fixtures: canned licenses on disk and builders for signed
//! licenses relative to a test clock.
//!
//! Signatures produced here are JWT-shaped (`header.payload.signature`) with
//! a base64url JSON payload, which is all the governor decodes.

use std::collections::BTreeSet;
use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;

use tollgate_core::config::LicenseConfig;
use tollgate_core::models::{License, PlanLimits};

/// Extension id the default [`LicenseConfig`] runs as.
pub fn extension_id() -> String {
    LicenseConfig::default().extension_id
}

/// A fixed instant well before every on-disk fixture expires.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixture_now is a valid date"))
}

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file under `data/`.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Unlimited pro plan for `user-pro-001`, bound to the default extension id.
pub fn pro_license() -> License {
    load_fixture("licenses/pro.json")
}

/// Free plan for `user-free-001`: 100 AI requests, no extension binding.
pub fn free_license() -> License {
    load_fixture("licenses/free.json")
}

/// JWT-shaped signature carrying `userId`, `exp` (seconds) and an optional
/// `extensionId`.
pub fn signature(user_id: &str, exp: DateTime<Utc>, extension_id: Option<&str>) -> String {
    let mut claims = json!({ "userId": user_id, "exp": exp.timestamp() });
    if let Some(ext) = extension_id {
        claims["extensionId"] = json!(ext);
    }
    encode_parts(&json!({ "alg": "RS256", "typ": "JWT" }), &claims)
}

/// Signature-shaped string whose payload is the given raw JSON.
pub fn signature_with_claims(claims: &serde_json::Value) -> String {
    encode_parts(&json!({ "alg": "RS256", "typ": "JWT" }), claims)
}

fn encode_parts(header: &serde_json::Value, claims: &serde_json::Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode("test-signature"),
    )
}

/// Builds licenses relative to a given "now".
#[derive(Debug, Clone)]
pub struct LicenseBuilder {
    now: DateTime<Utc>,
    user_id: String,
    plan_id: String,
    expires_in: Duration,
    token_expires_in: Option<Duration>,
    token_user: Option<String>,
    extension_id: Option<String>,
    features: BTreeSet<String>,
    limits: PlanLimits,
    signed: bool,
}

impl LicenseBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            user_id: "user-test-001".to_string(),
            plan_id: "pro_monthly".to_string(),
            expires_in: Duration::days(30),
            token_expires_in: None,
            token_user: None,
            extension_id: Some(extension_id()),
            features: BTreeSet::new(),
            limits: PlanLimits::unlimited(),
            signed: true,
        }
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    pub fn plan(mut self, plan_id: &str) -> Self {
        self.plan_id = plan_id.to_string();
        self
    }

    /// License expiry relative to now. Negative means already expired.
    pub fn expires_in(mut self, d: Duration) -> Self {
        self.expires_in = d;
        self
    }

    /// Signature `exp` relative to now; defaults to the license expiry.
    pub fn token_expires_in(mut self, d: Duration) -> Self {
        self.token_expires_in = Some(d);
        self
    }

    /// Put a different user id in the signature than on the license.
    pub fn token_user(mut self, user_id: &str) -> Self {
        self.token_user = Some(user_id.to_string());
        self
    }

    /// `None` omits `extensionId` from the signature.
    pub fn extension(mut self, extension_id: Option<&str>) -> Self {
        self.extension_id = extension_id.map(str::to_string);
        self
    }

    pub fn feature(mut self, feature_id: &str) -> Self {
        self.features.insert(feature_id.to_string());
        self
    }

    pub fn features(mut self, ids: &[&str]) -> Self {
        self.features.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn ai_requests(mut self, limit: i64) -> Self {
        self.limits.ai_requests = limit;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    pub fn build(self) -> License {
        let expires_at = self.now + self.expires_in;
        let token_exp = self.now + self.token_expires_in.unwrap_or(self.expires_in);
        let token_user = self.token_user.as_deref().unwrap_or(&self.user_id);
        let signature = self
            .signed
            .then(|| signature(token_user, token_exp, self.extension_id.as_deref()));
        License {
            user_id: self.user_id,
            plan_id: self.plan_id,
            is_valid: true,
            expires_at,
            features: self.features,
            limits: self.limits,
            signature,
        }
    }
}
