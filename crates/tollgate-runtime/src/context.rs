//! GovernanceContext: the one place the governance components are built.
//!
//! Construct it once at startup and hand references to collaborators.
//! Both cache stores share one durable tier, isolated by namespace.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;

use tollgate_cache::{CacheStore, MemoryTier, SqliteTier};
use tollgate_core::clock::{IClock, SystemClock};
use tollgate_core::config::TollgateConfig;
use tollgate_core::constants::GOVERNOR_NAMESPACE;
use tollgate_core::errors::{TollgateError, TollgateResult};
use tollgate_core::models::{FeatureAccess, License};
use tollgate_core::traits::ICacheTier;
use tollgate_license::LicenseGovernor;
use tollgate_ratelimit::{RateLimitRule, RateLimiter};

use crate::scheduler::PeriodicTask;
use crate::tracing_setup::{events, spans};

pub struct GovernanceContext {
    config: TollgateConfig,
    clock: Arc<dyn IClock>,
    cache: Arc<CacheStore>,
    limiter: Arc<RateLimiter>,
    governor: Arc<LicenseGovernor>,
    tasks: Mutex<Vec<PeriodicTask>>,
}

impl GovernanceContext {
    /// Build from config with the system clock. The durable tier is SQLite
    /// at `cache.durable_path`, or an in-process tier when unset.
    pub fn new(config: TollgateConfig) -> TollgateResult<Self> {
        config.validate()?;
        let durable: Arc<dyn ICacheTier> = match config.cache.durable_path.as_deref() {
            Some(path) => Arc::new(SqliteTier::open(Path::new(path))?),
            None => Arc::new(MemoryTier::new()),
        };
        Self::with_parts(config, durable, Arc::new(SystemClock))
    }

    /// Build around an explicit durable tier and clock.
    pub fn with_parts(
        config: TollgateConfig,
        durable: Arc<dyn ICacheTier>,
        clock: Arc<dyn IClock>,
    ) -> TollgateResult<Self> {
        config.validate()?;
        let cache = Arc::new(CacheStore::new(
            Arc::clone(&durable),
            Arc::clone(&clock),
            config.cache.clone(),
        ));
        let governor_store = Arc::new(CacheStore::with_namespace(
            GOVERNOR_NAMESPACE,
            durable,
            Arc::clone(&clock),
            config.cache.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            Arc::clone(&clock),
            config.rate_limit.clone(),
        ));
        let governor = Arc::new(LicenseGovernor::new(
            governor_store,
            Arc::clone(&clock),
            config.license.clone(),
        ));
        Ok(Self {
            config,
            clock,
            cache,
            limiter,
            governor,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &TollgateConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn IClock> {
        &self.clock
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn governor(&self) -> &Arc<LicenseGovernor> {
        &self.governor
    }

    /// Start the cache expiry sweep and the limiter cleanup. Calling it
    /// while already running does nothing.
    pub fn start(&self) -> TollgateResult<()> {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            return Ok(());
        }

        let cache = Arc::clone(&self.cache);
        let governor = Arc::clone(&self.governor);
        tasks.push(PeriodicTask::spawn(
            "cache_sweep",
            Duration::from_secs(self.config.cache.sweep_interval_secs),
            move || {
                let general = cache.sweep_expired();
                governor.sweep_expired();
                events::cache_swept(general.memory_removed, general.durable_removed);
            },
        )?);

        let limiter = Arc::clone(&self.limiter);
        tasks.push(PeriodicTask::spawn(
            "limiter_cleanup",
            Duration::from_secs(self.config.rate_limit.cleanup_interval_secs),
            move || {
                let removed = limiter.cleanup();
                events::limiter_cleaned(removed, limiter.tracked_keys());
            },
        )?);

        events::lifecycle("started", tasks.len());
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Stop all background tasks.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let stopped = tasks.len();
        for task in tasks.drain(..) {
            task.cancel();
        }
        if stopped > 0 {
            events::lifecycle("stopped", stopped);
        }
    }

    /// Feature check that logs denials.
    pub fn check_feature(&self, feature_id: &str, license: Option<&License>) -> FeatureAccess {
        let _span = spans::license_check(feature_id).entered();
        let access = self.governor.check_feature_access(feature_id, license);
        if !access.has_access {
            events::feature_denied(feature_id, access.requires_upgrade);
        }
        access
    }

    /// Serve `cache_key` from cache, otherwise spend one request of the
    /// `rate_key` budget and fetch through the single-flight cache.
    ///
    /// Cache hits never consume rate budget. A denied request returns
    /// [`TollgateError::RateLimited`] without calling `fetcher`.
    pub async fn guarded_fetch<T, F, Fut>(
        &self,
        rate_key: &str,
        rule: &RateLimitRule,
        cache_key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> TollgateResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TollgateResult<T>>,
    {
        async move {
            if let Some(hit) = self.cache.get(cache_key) {
                return Ok(hit);
            }
            let decision = self.limiter.check_rule(rate_key, rule);
            if !decision.allowed {
                let retry_after_secs = decision.retry_after.unwrap_or(0);
                events::rate_limited(rate_key, retry_after_secs);
                return Err(TollgateError::RateLimited {
                    key: rate_key.to_string(),
                    retry_after_secs,
                });
            }
            self.cache.get_or_set(cache_key, ttl, fetcher).await
        }
        .instrument(spans::cache_fetch(cache_key))
        .await
    }
}

impl Drop for GovernanceContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for GovernanceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceContext")
            .field("cache", &self.cache)
            .field("limiter", &self.limiter)
            .field("governor", &self.governor)
            .field("running", &self.is_running())
            .finish()
    }
}
