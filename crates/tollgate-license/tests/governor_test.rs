use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;

use test_fixtures::{fixture_now, free_license, pro_license, signature_with_claims, LicenseBuilder};
use tollgate_cache::{CacheStore, MemoryTier};
use tollgate_core::clock::ManualClock;
use tollgate_core::config::{CacheConfig, LicenseConfig};
use tollgate_core::constants::GOVERNOR_NAMESPACE;
use tollgate_core::errors::{LicenseError, TollgateError, TollgateResult};
use tollgate_core::models::{FeatureId, License, PlanLimits};
use tollgate_core::traits::ILicenseSource;
use tollgate_license::LicenseGovernor;

fn setup() -> (LicenseGovernor, Arc<ManualClock>) {
    setup_with(LicenseConfig::default())
}

fn setup_with(config: LicenseConfig) -> (LicenseGovernor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(fixture_now()));
    let store = Arc::new(CacheStore::with_namespace(
        GOVERNOR_NAMESPACE,
        Arc::new(MemoryTier::new()),
        clock.clone(),
        CacheConfig::default(),
    ));
    (LicenseGovernor::new(store, clock.clone(), config), clock)
}

fn builder() -> LicenseBuilder {
    LicenseBuilder::new(fixture_now())
}

// ── validation ──────────────────────────────────────────────────────────

#[test]
fn fixture_licenses_validate() {
    let (gov, _) = setup();
    assert!(gov.validate_license(Some(&pro_license())).is_valid);
    assert!(gov.validate_license(Some(&free_license())).is_valid);
}

#[test]
fn no_license_anywhere_is_not_found() {
    let (gov, _) = setup();
    let v = gov.validate_license(None);
    assert!(!v.is_valid);
    assert_eq!(v.error_message().as_deref(), Some("No license found"));
}

#[test]
fn missing_signature_is_invalid_format() {
    let (gov, _) = setup();
    let v = gov.validate_license(Some(&builder().unsigned().build()));
    assert_eq!(v.error, Some(LicenseError::InvalidFormat));
    assert_eq!(v.error_message().as_deref(), Some("Invalid license format"));
}

#[test]
fn undecodable_signature_is_invalid_signature() {
    let (gov, _) = setup();
    let mut license = builder().build();
    license.signature = Some("not-a-token".into());
    assert_eq!(
        gov.validate_license(Some(&license)).error,
        Some(LicenseError::InvalidSignature)
    );
}

#[test]
fn expired_license_is_rejected() {
    let (gov, _) = setup();
    let license = builder()
        .expires_in(Duration::hours(-1))
        .token_expires_in(Duration::days(1))
        .build();
    let v = gov.validate_license(Some(&license));
    assert!(!v.is_valid);
    assert_eq!(v.error_message().as_deref(), Some("License expired"));
}

#[test]
fn expiry_at_exactly_now_is_expired() {
    let (gov, _) = setup();
    let license = builder().expires_in(Duration::zero()).build();
    assert_eq!(gov.validate_license(Some(&license)).error, Some(LicenseError::Expired));
}

#[test]
fn expired_signature_is_token_expired() {
    let (gov, _) = setup();
    let license = builder().token_expires_in(Duration::hours(-2)).build();
    assert_eq!(
        gov.validate_license(Some(&license)).error,
        Some(LicenseError::TokenExpired)
    );
}

#[test]
fn foreign_extension_is_rejected() {
    let (gov, _) = setup();
    let license = builder().extension(Some("someone-else")).build();
    assert_eq!(
        gov.validate_license(Some(&license)).error_message().as_deref(),
        Some("License not valid for this extension")
    );
    // No binding at all is accepted.
    let unbound = builder().extension(None).build();
    assert!(gov.validate_license(Some(&unbound)).is_valid);
}

#[test]
fn user_mismatch_is_rejected() {
    let (gov, _) = setup();
    let license = builder().token_user("mallory").build();
    assert_eq!(
        gov.validate_license(Some(&license)).error,
        Some(LicenseError::UserMismatch)
    );
}

#[test]
fn checks_stop_at_first_failure() {
    let (gov, _) = setup();
    // Expired and bound to another extension and user: expiry wins.
    let license = builder()
        .expires_in(Duration::hours(-1))
        .extension(Some("other"))
        .token_user("mallory")
        .build();
    assert_eq!(gov.validate_license(Some(&license)).error, Some(LicenseError::Expired));
}

#[test]
fn sub_claim_identifies_user() {
    let (gov, _) = setup();
    let mut license = builder().user("u-sub").build();
    let exp = (fixture_now() + Duration::days(3)).timestamp();
    license.signature = Some(signature_with_claims(&serde_json::json!({ "sub": "u-sub", "exp": exp })));
    assert!(gov.validate_license(Some(&license)).is_valid);
}

// ── feature access ──────────────────────────────────────────────────────

#[test]
fn metered_feature_at_limit_requires_upgrade() {
    let (gov, _) = setup();
    let license = builder().feature("ai_requests").ai_requests(100).build();
    gov.usage()
        .record_usage(&license.user_id, &FeatureId::AiRequests, 100);

    let access = gov.check_feature_access("ai_requests", Some(&license));
    assert!(!access.has_access);
    assert!(access.requires_upgrade);
    assert_eq!(access.limit, Some(100));
    assert_eq!(access.used, Some(100));
    assert!(access.reset_date.is_some());
}

#[test]
fn metered_feature_under_limit_is_allowed() {
    let (gov, _) = setup();
    let license = builder().feature("ai_requests").ai_requests(100).build();
    gov.usage()
        .record_usage(&license.user_id, &FeatureId::AiRequests, 99);
    let access = gov.check_feature_access("ai_requests", Some(&license));
    assert!(access.has_access);
    assert!(!access.requires_upgrade);
    assert_eq!(access.used, Some(99));
}

#[test]
fn unlimited_feature_always_allowed() {
    let (gov, _) = setup();
    let license = builder().feature("ai_requests").ai_requests(-1).build();
    gov.usage()
        .record_usage(&license.user_id, &FeatureId::AiRequests, 1_000_000);
    let access = gov.check_feature_access("ai_requests", Some(&license));
    assert!(access.has_access);
    assert_eq!(access.limit, Some(-1));
}

#[test]
fn zero_limit_denies() {
    let (gov, _) = setup();
    let license = free_license();
    // free plan lists no file uploads feature and a zero limit.
    assert!(!gov.check_feature_access("file_uploads", Some(&license)).has_access);
}

#[test]
fn feature_missing_from_license_is_denied() {
    let (gov, _) = setup();
    let license = builder().feature("ai_requests").build();
    let access = gov.check_feature_access("conversations", Some(&license));
    assert!(!access.has_access);
    assert!(access.requires_upgrade);
}

#[test]
fn priority_support_follows_limits_flag() {
    let (gov, _) = setup();
    let with = builder().feature("priority_support").build();
    assert!(gov.check_feature_access("priority_support", Some(&with)).has_access);

    let without = builder()
        .feature("priority_support")
        .limits(PlanLimits::default())
        .build();
    assert!(!gov.check_feature_access("priority_support", Some(&without)).has_access);
}

#[test]
fn advanced_features_need_listing_in_limits() {
    let (gov, _) = setup();
    let license = pro_license();
    assert!(gov.check_feature_access("analytics", Some(&license)).has_access);

    let unknown = builder().feature("teleport").build();
    assert!(!gov.check_feature_access("teleport", Some(&unknown)).has_access);
}

#[test]
fn invalid_license_denies_everything() {
    let (gov, _) = setup();
    let license = builder()
        .feature("ai_requests")
        .expires_in(Duration::hours(-1))
        .build();
    let access = gov.check_feature_access("ai_requests", Some(&license));
    assert!(!access.has_access);
    assert!(access.requires_upgrade);
    assert_eq!(access.limit, None);
}

#[test]
fn check_uses_cached_license_when_none_given() {
    let (gov, _) = setup();
    gov.install_license(pro_license());
    assert!(gov.check_feature_access("conversations", None).has_access);
}

#[test]
fn require_feature_access_errors_on_denial() {
    let (gov, _) = setup();
    let license = builder().feature("ai_requests").build();

    assert!(gov.require_feature_access("ai_requests", Some(&license)).is_ok());

    let err = gov
        .require_feature_access("custom_prompts", Some(&license))
        .unwrap_err();
    assert_eq!(err.code(), "FEATURE_NOT_AVAILABLE");
    assert!(matches!(
        err,
        TollgateError::FeatureNotAvailable { requires_upgrade: true, .. }
    ));

    let err = gov.require_feature_access("ai_requests", None).unwrap_err();
    assert!(matches!(err, TollgateError::LicenseError(LicenseError::NotFound)));
}

#[test]
fn validate_features_reports_each_id() {
    let (gov, _) = setup();
    let license = free_license();
    let results = gov.validate_features(["ai_requests", "file_uploads", "analytics"], Some(&license));
    assert_eq!(results.len(), 3);
    assert!(results["ai_requests"].has_access);
    assert!(!results["file_uploads"].has_access);
    assert!(!results["analytics"].has_access);
}

// ── refresh & lifecycle ─────────────────────────────────────────────────

#[test]
fn needs_refresh_inside_threshold() {
    let (gov, clock) = setup();
    assert!(gov.needs_refresh(None));

    let license = builder().expires_in(Duration::hours(48)).build();
    assert!(!gov.needs_refresh(Some(&license)));
    clock.advance(Duration::hours(25));
    assert!(gov.needs_refresh(Some(&license)));
}

#[test]
fn huge_refresh_threshold_always_refreshes() {
    let (gov, _) = setup_with(LicenseConfig {
        refresh_threshold_hours: i64::MAX,
        ..LicenseConfig::default()
    });
    assert!(gov.needs_refresh(Some(&pro_license())));
}

#[test]
fn install_caches_only_valid_licenses() {
    let (gov, _) = setup();
    let bad = builder().unsigned().build();
    assert!(!gov.install_license(bad).is_valid);
    assert!(gov.cached_license().is_none());

    let good = pro_license();
    assert!(gov.install_license(good.clone()).is_valid);
    assert_eq!(gov.cached_license(), Some(good));

    gov.clear_license();
    assert!(gov.cached_license().is_none());
}

#[test]
fn cached_license_does_not_outlive_expiry() {
    let (gov, clock) = setup();
    let license = builder().expires_in(Duration::hours(2)).build();
    gov.install_license(license);
    clock.advance(Duration::hours(3));
    assert!(gov.cached_license().is_none());
    assert_eq!(gov.validate_license(None).error, Some(LicenseError::NotFound));
}

struct StubSource {
    license: Option<License>,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(license: Option<License>) -> Self {
        Self {
            license,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ILicenseSource for StubSource {
    fn fetch_license(&self) -> impl Future<Output = TollgateResult<License>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.license.clone().ok_or(TollgateError::FetchFailed {
            reason: "backend unreachable".into(),
        });
        async move { result }
    }
}

#[tokio::test]
async fn refresh_caches_fetched_license() {
    let (gov, _) = setup();
    let source = StubSource::new(Some(pro_license()));
    let v = gov.refresh_license(&source).await;
    assert!(v.is_valid);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gov.cached_license().map(|l| l.user_id), Some("user-pro-001".into()));
}

#[tokio::test]
async fn refresh_falls_back_to_cache_when_fetch_fails() {
    let (gov, _) = setup();
    gov.install_license(free_license());
    let v = gov.refresh_license(&StubSource::new(None)).await;
    assert!(v.is_valid);
    assert_eq!(v.license.map(|l| l.plan_id), Some("free".into()));
}

#[tokio::test]
async fn refresh_failure_without_cache_is_not_found() {
    let (gov, _) = setup();
    let v = gov.refresh_license(&StubSource::new(None)).await;
    assert_eq!(v.error, Some(LicenseError::NotFound));
}

#[tokio::test]
async fn refreshed_invalid_license_evicts_cache() {
    let (gov, _) = setup();
    gov.install_license(pro_license());
    let revoked = LicenseBuilder::new(fixture_now())
        .user("user-pro-001")
        .expires_in(Duration::hours(-1))
        .build();
    let v = gov.refresh_license(&StubSource::new(Some(revoked))).await;
    assert_eq!(v.error, Some(LicenseError::Expired));
    assert!(gov.cached_license().is_none());
}
