//! LicenseGovernor: license validation and feature gating.
//!
//! The governor owns a store in the `governor` namespace holding the last
//! validated license and the usage records. It never performs network I/O;
//! fresh licenses arrive through [`ILicenseSource`] or [`LicenseGovernor::install_license`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tracing::{debug, info, instrument, warn};

use tollgate_cache::{CacheStore, SweepReport};
use tollgate_core::clock::IClock;
use tollgate_core::config::LicenseConfig;
use tollgate_core::constants::{LICENSE_KEY, OFFLINE_TOKEN_TYPE, UNLIMITED};
use tollgate_core::errors::{LicenseError, TollgateError, TollgateResult};
use tollgate_core::models::{
    FeatureAccess, FeatureId, License, LicenseValidation, OfflineToken, TokenValidation,
};
use tollgate_core::traits::ILicenseSource;

use crate::offline;
use crate::signature::decode_signature;
use crate::usage::UsageTracker;

pub struct LicenseGovernor {
    config: LicenseConfig,
    store: Arc<CacheStore>,
    clock: Arc<dyn IClock>,
    usage: UsageTracker,
}

impl LicenseGovernor {
    /// `store` should be scoped to the governor namespace; usage records
    /// share it.
    pub fn new(store: Arc<CacheStore>, clock: Arc<dyn IClock>, config: LicenseConfig) -> Self {
        let retention = Duration::from_secs(config.usage_ttl_days.saturating_mul(86_400));
        let usage = UsageTracker::new(Arc::clone(&store), Arc::clone(&clock), retention);
        Self {
            config,
            store,
            clock,
            usage,
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// The last license cached by a refresh or install, if still held.
    pub fn cached_license(&self) -> Option<License> {
        self.store.get(LICENSE_KEY)
    }

    /// Validate `license`, or the cached license when `None`.
    ///
    /// Checks run in order and stop at the first failure: signature present,
    /// signature decodes, license not expired, signature not expired,
    /// extension binding, user binding.
    pub fn validate_license(&self, license: Option<&License>) -> LicenseValidation {
        let cached;
        let license = match license {
            Some(l) => l,
            None => match self.cached_license() {
                Some(l) => {
                    cached = l;
                    &cached
                }
                None => return LicenseValidation::invalid(LicenseError::NotFound),
            },
        };
        match self.check(license) {
            Ok(()) => LicenseValidation::valid(license.clone()),
            Err(e) => {
                debug!(user_id = %license.user_id, error = %e, "license rejected");
                LicenseValidation::invalid(e)
            }
        }
    }

    fn check(&self, license: &License) -> Result<(), LicenseError> {
        let signature = license
            .signature
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(LicenseError::InvalidFormat)?;
        let claims = decode_signature(signature)?;

        let now = self.clock.now();
        if license.is_expired_at(now) {
            return Err(LicenseError::Expired);
        }
        if claims.exp_millis() <= now.timestamp_millis() {
            return Err(LicenseError::TokenExpired);
        }
        if claims
            .extension_id
            .as_deref()
            .is_some_and(|ext| ext != self.config.extension_id)
        {
            return Err(LicenseError::ExtensionMismatch);
        }
        if claims.user_id != license.user_id {
            return Err(LicenseError::UserMismatch);
        }
        Ok(())
    }

    /// Decide access to one feature. Never fails; denial is data.
    #[instrument(skip(self, license))]
    pub fn check_feature_access(&self, feature_id: &str, license: Option<&License>) -> FeatureAccess {
        let validation = self.validate_license(license);
        self.access_for(feature_id, &validation)
    }

    /// Like [`check_feature_access`](Self::check_feature_access) but an
    /// invalid license or a denial is an `Err`.
    pub fn require_feature_access(
        &self,
        feature_id: &str,
        license: Option<&License>,
    ) -> TollgateResult<FeatureAccess> {
        let validation = self.validate_license(license);
        if let Some(e) = validation.error {
            return Err(e.into());
        }
        let access = self.access_for(feature_id, &validation);
        if access.has_access {
            Ok(access)
        } else {
            Err(TollgateError::FeatureNotAvailable {
                feature_id: feature_id.to_string(),
                requires_upgrade: access.requires_upgrade,
            })
        }
    }

    /// Access decisions for several features against one validation.
    pub fn validate_features<I, S>(
        &self,
        feature_ids: I,
        license: Option<&License>,
    ) -> BTreeMap<String, FeatureAccess>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let validation = self.validate_license(license);
        feature_ids
            .into_iter()
            .map(|id| {
                let id = id.as_ref();
                (id.to_string(), self.access_for(id, &validation))
            })
            .collect()
    }

    fn access_for(&self, feature_id: &str, validation: &LicenseValidation) -> FeatureAccess {
        let Some(license) = validation.license.as_ref().filter(|_| validation.is_valid) else {
            return FeatureAccess::denied(feature_id);
        };
        if !license.has_feature(feature_id) {
            return FeatureAccess::denied(feature_id);
        }

        let id = FeatureId::from(feature_id);
        match license.limits.limit_for(&id) {
            Some(limit) => {
                let used = self.usage.current_usage(&license.user_id).used(&id);
                let has_access =
                    limit == UNLIMITED || u64::try_from(limit).is_ok_and(|limit| used < limit);
                FeatureAccess {
                    feature_id: feature_id.to_string(),
                    has_access,
                    limit: Some(limit),
                    used: Some(used),
                    reset_date: Some(self.usage.reset_date()),
                    requires_upgrade: !has_access,
                }
            }
            None => {
                let granted = match &id {
                    FeatureId::PrioritySupport => license.limits.priority_support,
                    other => license.limits.advanced_features.contains(other.as_str()),
                };
                FeatureAccess::flag(feature_id, granted)
            }
        }
    }

    /// Issue an offline token for a license that currently validates.
    /// `duration_hours` defaults to the configured lifetime; a lifetime
    /// past the representable date range is an `InvalidTokenFormat` error.
    pub fn generate_offline_token(
        &self,
        license: &License,
        duration_hours: Option<u32>,
    ) -> Result<String, LicenseError> {
        let validation = self.validate_license(Some(license));
        if let Some(e) = validation.error {
            return Err(e);
        }
        let hours = duration_hours.unwrap_or(self.config.offline_token_hours);
        let now = self.clock.now();
        let expires_at = ChronoDuration::try_hours(i64::from(hours))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(LicenseError::InvalidTokenFormat)?;
        let token = OfflineToken {
            user_id: license.user_id.clone(),
            plan_id: license.plan_id.clone(),
            features: license.features.clone(),
            limits: license.limits.clone(),
            extension_id: self.config.extension_id.clone(),
            generated_at: now,
            expires_at,
            token_type: OFFLINE_TOKEN_TYPE.to_string(),
        };
        let encoded = offline::encode(&token, &self.config.key_material)?;
        info!(user_id = %token.user_id, hours, "offline token issued");
        Ok(encoded)
    }

    /// Verify an offline token's checksum, type, expiry and extension.
    pub fn validate_offline_token(&self, token: &str) -> TokenValidation {
        let data = match offline::decode(token, &self.config.key_material) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "offline token rejected");
                return TokenValidation::invalid(e);
            }
        };
        if data.token_type != OFFLINE_TOKEN_TYPE {
            return TokenValidation::invalid(LicenseError::InvalidTokenFormat);
        }
        if data.expires_at <= self.clock.now() {
            return TokenValidation::invalid(LicenseError::OfflineTokenExpired);
        }
        if data.extension_id != self.config.extension_id {
            return TokenValidation::invalid(LicenseError::ExtensionMismatch);
        }
        TokenValidation::valid(data)
    }

    /// Whether `license` (or the cached one) is missing or within the
    /// refresh threshold of expiry.
    pub fn needs_refresh(&self, license: Option<&License>) -> bool {
        let remaining = match license {
            Some(l) => l.remaining(self.clock.now()),
            None => match self.cached_license() {
                Some(l) => l.remaining(self.clock.now()),
                None => return true,
            },
        };
        match ChronoDuration::try_hours(self.config.refresh_threshold_hours) {
            Some(threshold) => remaining < threshold,
            None => true,
        }
    }

    /// Fetch a fresh license and cache it if it validates.
    ///
    /// A fetch failure falls back to the cached license. A fetched license
    /// that fails validation replaces nothing and evicts the cached one.
    pub async fn refresh_license<S: ILicenseSource>(&self, source: &S) -> LicenseValidation {
        match source.fetch_license().await {
            Ok(license) => {
                let validation = self.install_license(license);
                if !validation.is_valid {
                    self.clear_license();
                }
                validation
            }
            Err(e) => {
                warn!(error = %e, "license fetch failed, using cached license");
                self.validate_license(None)
            }
        }
    }

    /// Validate and cache a license obtained elsewhere. Invalid licenses
    /// are not cached.
    pub fn install_license(&self, license: License) -> LicenseValidation {
        let validation = self.validate_license(Some(&license));
        if validation.is_valid {
            let until_expiry = license
                .remaining(self.clock.now())
                .to_std()
                .unwrap_or_default();
            let ttl = until_expiry.min(Duration::from_secs(self.config.license_cache_ttl_secs));
            self.store.set(LICENSE_KEY, &license, ttl);
            info!(user_id = %license.user_id, plan_id = %license.plan_id, "license cached");
        }
        validation
    }

    /// Forget the cached license.
    pub fn clear_license(&self) {
        self.store.invalidate(LICENSE_KEY);
    }

    /// Drop expired license and usage entries from the governor store.
    pub fn sweep_expired(&self) -> SweepReport {
        self.store.sweep_expired()
    }
}

impl std::fmt::Debug for LicenseGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGovernor")
            .field("extension_id", &self.config.extension_id)
            .field("namespace", &self.store.namespace())
            .finish()
    }
}
