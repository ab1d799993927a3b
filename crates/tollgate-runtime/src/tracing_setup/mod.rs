//! Tracing setup: subscriber installation, span helpers and event types.

pub mod events;
pub mod spans;

use tracing_subscriber::EnvFilter;

use tollgate_core::config::ObservabilityConfig;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "TOLLGATE_LOG";

/// Install the global subscriber.
///
/// `TOLLGATE_LOG` takes precedence over `log_level`. Safe to call more than
/// once; returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
