//! Bounded retry with exponential backoff and cancellation.
//!
//! Each attempt is preceded by a cancellation check, and every backoff sleep
//! races against the cancellation token, so a cancelled caller never waits
//! out a full delay.
//!
//! # Example
//!
//! ```rust,ignore
//! use paper_engine::resilience::{RetryConfig, execute};
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let value = execute(&token, &RetryConfig::default(), || async {
//!     client.fetch().await
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::error_kind::{Classify, Retryability};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Additional attempts after the first (default: 3).
    pub max_retries: u32,
    /// Delay before the first retry (default: 100ms).
    pub initial_backoff: Duration,
    /// Backoff cap (default: 5s).
    pub max_backoff: Duration,
    /// Exponential growth factor (default: 2.0).
    pub backoff_factor: f64,
    /// Jitter fraction; 0.0 gives deterministic delays (default: 0.0).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_factor: 2.0,
            jitter_factor: 0.0,
        }
    }
}

impl RetryConfig {
    /// Total attempts allowed, first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after the failed attempt with 0-based index `attempt`:
    /// `min(initial_backoff * backoff_factor^attempt, max_backoff)`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = if scaled.is_finite() {
            scaled.min(self.max_backoff.as_secs_f64())
        } else {
            self.max_backoff.as_secs_f64()
        };
        self.apply_jitter(Duration::from_secs_f64(capped.max(0.0)))
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let base = delay.as_secs_f64();
        let spread = base * self.jitter_factor;
        let jittered = rand::rng().random_range((base - spread).max(0.0)..=base + spread);
        Duration::from_secs_f64(jittered).min(self.max_backoff)
    }
}

/// Failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed with a non-retryable error.
    #[error("non-retryable error: {0}")]
    Terminal(#[source] E),

    /// Every allowed attempt failed.
    #[error("operation failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Last underlying error.
        source: E,
    },

    /// The caller cancelled before the operation succeeded.
    #[error("retry cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
        /// Last underlying error, if any attempt ran.
        last: Option<E>,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Number of attempts made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Terminal(_) => 1,
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The last underlying error, if any.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Terminal(e) | Self::Exhausted { source: e, .. } => Some(e),
            Self::Cancelled { last, .. } => last,
        }
    }
}

/// Run `operation` until it succeeds, fails terminally, runs out of attempts,
/// or `token` is cancelled.
///
/// # Errors
///
/// Returns [`RetryError::Terminal`] on the first non-retryable failure,
/// [`RetryError::Exhausted`] after `max_retries + 1` retryable failures and
/// [`RetryError::Cancelled`] when the token fires before an attempt or during
/// a backoff.
pub async fn execute<T, E, F, Fut>(
    token: &CancellationToken,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + std::error::Error + 'static,
{
    let mut attempts = 0_u32;
    let mut last: Option<E> = None;

    loop {
        if token.is_cancelled() {
            tracing::debug!(attempts, "retry cancelled before attempt");
            return Err(RetryError::Cancelled { attempts, last });
        }

        attempts += 1;
        let error = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(attempts, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if error.retryability() == Retryability::Terminal {
            tracing::debug!(attempts, error = %error, "non-retryable error");
            return Err(RetryError::Terminal(error));
        }
        if attempts >= config.max_attempts() {
            tracing::warn!(attempts, error = %error, "retries exhausted");
            return Err(RetryError::Exhausted {
                attempts,
                source: error,
            });
        }

        let delay = config.backoff_for(attempts - 1);
        tracing::warn!(
            attempt = attempts,
            max_attempts = config.max_attempts(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            kind = %error.error_kind(),
            error = %error,
            "retryable error, backing off"
        );
        last = Some(error);

        tokio::select! {
            () = token.cancelled() => {
                tracing::debug!(attempts, "retry cancelled during backoff");
                return Err(RetryError::Cancelled { attempts, last });
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// A retry configuration bundled for repeated use.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create an executor with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` with this executor's configuration.
    ///
    /// # Errors
    ///
    /// See [`execute`].
    pub async fn run<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        execute(token, &self.config, operation).await
    }
}
