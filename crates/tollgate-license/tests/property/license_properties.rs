use std::sync::Arc;

use chrono::Duration;
use proptest::prelude::*;

use test_fixtures::{fixture_now, LicenseBuilder};
use tollgate_cache::{CacheStore, MemoryTier};
use tollgate_core::clock::ManualClock;
use tollgate_core::config::{CacheConfig, LicenseConfig};
use tollgate_core::constants::GOVERNOR_NAMESPACE;
use tollgate_core::errors::LicenseError;
use tollgate_core::models::FeatureId;
use tollgate_license::LicenseGovernor;

fn governor() -> LicenseGovernor {
    let clock = Arc::new(ManualClock::new(fixture_now()));
    let store = Arc::new(CacheStore::with_namespace(
        GOVERNOR_NAMESPACE,
        Arc::new(MemoryTier::new()),
        clock.clone(),
        CacheConfig::default(),
    ));
    LicenseGovernor::new(store, clock, LicenseConfig::default())
}

proptest! {
    #[test]
    fn quota_access_is_used_below_limit(limit in 0i64..500, used in 0u64..600) {
        let gov = governor();
        let license = LicenseBuilder::new(fixture_now())
            .feature("ai_requests")
            .ai_requests(limit)
            .build();
        if used > 0 {
            gov.usage().record_usage(&license.user_id, &FeatureId::AiRequests, used);
        }
        let access = gov.check_feature_access("ai_requests", Some(&license));
        prop_assert_eq!(access.has_access, used < limit as u64);
        prop_assert_eq!(access.requires_upgrade, !access.has_access);
        prop_assert_eq!(access.used, Some(used));
    }

    #[test]
    fn any_past_expiry_is_rejected(minutes_ago in 0i64..100_000) {
        let gov = governor();
        let license = LicenseBuilder::new(fixture_now())
            .expires_in(Duration::minutes(-minutes_ago))
            .token_expires_in(Duration::days(1))
            .build();
        let v = gov.validate_license(Some(&license));
        prop_assert_eq!(v.error, Some(LicenseError::Expired));
    }

    #[test]
    fn offline_tokens_validate_within_lifetime(hours in 1u32..200, elapsed_pct in 0u32..100) {
        let clock = Arc::new(ManualClock::new(fixture_now()));
        let store = Arc::new(CacheStore::with_namespace(
            GOVERNOR_NAMESPACE,
            Arc::new(MemoryTier::new()),
            clock.clone(),
            CacheConfig::default(),
        ));
        let gov = LicenseGovernor::new(store, clock.clone(), LicenseConfig::default());
        let license = LicenseBuilder::new(fixture_now()).expires_in(Duration::days(30)).build();
        let token = gov.generate_offline_token(&license, Some(hours)).unwrap();
        let elapsed_ms = i64::from(hours) * 3_600_000 * i64::from(elapsed_pct) / 100;
        clock.advance(Duration::milliseconds(elapsed_ms));
        prop_assert!(gov.validate_offline_token(&token).is_valid);
    }
}
