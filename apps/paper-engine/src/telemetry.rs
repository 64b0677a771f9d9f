//! Tracing Setup
//!
//! Installs a console `tracing_subscriber` for the paper engine.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; when unset, `observability.logging.level`
//!   from the config file is used
//! - `observability.logging.ansi`: colored output
//! - `observability.logging.with_target`: include module paths
//!
//! # Usage
//!
//! ```rust,ignore
//! use paper_engine::telemetry::init_telemetry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(&config.observability.logging)?;
//!     // ... application code
//!     Ok(())
//! }
//! ```

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

use crate::config::LoggingConfig;

/// Guard that flushes a final log line on drop.
///
/// Hold it for the lifetime of `main`.
#[derive(Debug)]
pub struct TelemetryGuard {
    filter: String,
}

impl TelemetryGuard {
    /// The filter directive that was installed.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(filter = %self.filter, "Telemetry shut down");
    }
}

/// Build the filter: `RUST_LOG` wins, then the configured level, then `info`.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console tracing.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_telemetry(config: &LoggingConfig) -> Result<TelemetryGuard, TryInitError> {
    let env_filter = build_filter(config);
    let filter = env_filter.to_string();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_ansi(config.ansi);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(filter = %filter, "Telemetry initialized");

    Ok(TelemetryGuard { filter })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "paper_engine=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&config).to_string(), "info");
    }

    #[test]
    fn configured_level_is_used_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "paper_engine=debug".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&config).to_string(), "paper_engine=debug");
    }
}
