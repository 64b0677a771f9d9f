//! Retry configuration for the resilience wrapper.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry/backoff settings as written in YAML (durations in milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Additional attempts after the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay (ms).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap (ms).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Exponential growth factor.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Random jitter fraction (0.0 disables).
    #[serde(default)]
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            jitter_factor: 0.0,
        }
    }
}

impl RetrySettings {
    /// Convert config settings to the resilience module's `RetryConfig`.
    #[must_use]
    pub const fn to_retry_config(&self) -> crate::resilience::RetryConfig {
        crate::resilience::RetryConfig {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            backoff_factor: self.backoff_factor,
            jitter_factor: self.jitter_factor,
        }
    }
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    100
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

const fn default_backoff_factor() -> f64 {
    2.0
}
