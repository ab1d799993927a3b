//! Periodic background tasks on the tokio runtime.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tollgate_core::errors::{TollgateError, TollgateResult};

use crate::tracing_setup::spans;

/// A task that calls a closure every `period` until cancelled or dropped.
///
/// The first call happens one full period after spawning.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn onto the current tokio runtime. Fails outside a runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> TollgateResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TollgateError::ConfigError {
                reason: format!("cannot start {name}: {e}"),
            }
        })?;
        let period = period.max(Duration::from_millis(1));
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                spans::sweep(name).in_scope(&mut tick);
            }
        });
        tracing::debug!(task = name, period_ms = period.as_millis() as u64, "periodic task started");
        Ok(Self {
            name,
            period,
            handle,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the task. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting(period: Duration) -> (PeriodicTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let task = PeriodicTask::spawn("test", period, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (_task, count) = counting(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (task, count) = counting(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        task.cancel();
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticks() {
        let (task, count) = counting(Duration::from_secs(10));
        drop(task);
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn spawn_outside_runtime_fails() {
        let result = PeriodicTask::spawn("orphan", Duration::from_secs(1), || {});
        assert!(result.is_err());
    }
}
