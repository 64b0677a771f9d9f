//! Configuration module for the paper engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the simulator, retry wrapper and logging.
//!
//! # Usage
//!
//! ```rust,ignore
//! use paper_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("taker fee: {}", config.simulator.taker_fee);
//! ```

mod observability;
mod retry;
mod simulator;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LoggingConfig, ObservabilityConfig};
pub use retry::RetrySettings;
pub use simulator::SimulatorConfig;

/// Environment variable naming the config file used by the binary.
pub const CONFIG_PATH_ENV: &str = "PAPER_ENGINE_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulated venue parameters.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Retry/backoff parameters.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn ensure_fraction(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "simulator.{name} must be in [0, 1), got {value}"
        )));
    }
    Ok(())
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first offending field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let sim = &config.simulator;
    ensure_fraction("maker_fee", sim.maker_fee)?;
    ensure_fraction("taker_fee", sim.taker_fee)?;
    ensure_fraction("base_slippage", sim.base_slippage)?;
    ensure_fraction("market_impact", sim.market_impact)?;
    ensure_fraction("max_slippage", sim.max_slippage)?;

    if sim.base_slippage > sim.max_slippage {
        return Err(ConfigError::ValidationError(
            "simulator.base_slippage must not exceed simulator.max_slippage".to_string(),
        ));
    }
    if sim.fallback_price <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "simulator.fallback_price must be positive".to_string(),
        ));
    }

    let retry = &config.retry;
    if !retry.backoff_factor.is_finite() || retry.backoff_factor < 1.0 {
        return Err(ConfigError::ValidationError(
            "retry.backoff_factor must be >= 1.0".to_string(),
        ));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return Err(ConfigError::ValidationError(
            "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "retry.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }

    Ok(())
}
