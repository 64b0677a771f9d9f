//! Resilience patterns for external service calls.
//!
//! Provides typed error classification and a cancellable retry executor
//! with exponential backoff.

mod error_kind;
mod retry;

pub use error_kind::{
    BROKER_RATE_LIMIT_CODE, Classify, ErrorKind, RETRYABLE_EXCHANGE_CODES, Retryability, classify,
};
pub use retry::{RetryConfig, RetryError, RetryExecutor, execute};
