//! Stable error codes for the paper engine.
//!
//! Subsystem errors (`ExchangeError`, `PositionError`, `StoreError`,
//! `RetryError`, `ConfigError`) are converted into an [`EngineError`] carrying
//! a stable [`ErrorCode`] before they leave the crate, so an external adapter
//! can map them onto its own protocol without matching on message text.
//!
//! | Code | HTTP | Usage |
//! |------|------|-------|
//! | `INVALID_REQUEST` | 400 | Malformed order or empty fill hand-off |
//! | `ORDER_NOT_FOUND` | 404 | Unknown order id |
//! | `INVALID_ORDER_STATE` | 409 | Cancel of a terminal order, bad transition |
//! | `NO_ACTIVE_SESSION` | 412 | Fill hand-off without a session |
//! | `STORE_UNAVAILABLE` | 503 | Persistence failed or retries exhausted |
//! | `CANCELLED` | 499 | Retry loop cancelled |
//! | `INVALID_CONFIG` | 500 | Config could not be loaded |
//! | `INTERNAL_ERROR` | 500 | Anything else |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::StoreError;
use crate::config::ConfigError;
use crate::domain::order_execution::OrderError;
use crate::execution::{ExchangeError, PositionError};
use crate::resilience::RetryError;

/// Error codes for the paper engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid request or fill hand-off.
    InvalidRequest,
    /// Order not found.
    OrderNotFound,
    /// Order is in a state that does not allow the operation.
    InvalidOrderState,
    /// Position manager has no active session.
    NoActiveSession,
    /// Store failure or exhausted retries.
    StoreUnavailable,
    /// Operation cancelled.
    Cancelled,
    /// Configuration error.
    InvalidConfig,
    /// Internal error.
    InternalError,
}

impl ErrorCode {
    /// HTTP status an adapter should use for this code.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::OrderNotFound => 404,
            Self::InvalidOrderState => 409,
            Self::NoActiveSession => 412,
            Self::Cancelled => 499,
            Self::StoreUnavailable => 503,
            Self::InvalidConfig | Self::InternalError => 500,
        }
    }

    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::InvalidOrderState => "INVALID_ORDER_STATE",
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::Cancelled => "CANCELLED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// An error with a stable code and context.
#[derive(Debug, Error)]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Convert to a serializable response body.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code,
            message: self.message.clone(),
            status: self.code.http_status(),
            details: self.context.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Response body for an [`EngineError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// HTTP status.
    pub status: u16,
    /// Additional details.
    pub details: std::collections::BTreeMap<String, String>,
}

impl ErrorResponse {
    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; none is expected for this shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

const fn order_error_code(error: &OrderError) -> ErrorCode {
    match error {
        OrderError::InvalidParameters(_) => ErrorCode::InvalidRequest,
        OrderError::InvalidStateTransition { .. }
        | OrderError::CannotCancel { .. }
        | OrderError::QuantityMismatch { .. }
        | OrderError::InvalidFillCount { .. } => ErrorCode::InvalidOrderState,
    }
}

impl From<&StoreError> for EngineError {
    fn from(error: &StoreError) -> Self {
        let code = match error {
            StoreError::Unavailable(_) | StoreError::Conflict(_) => ErrorCode::StoreUnavailable,
            StoreError::NotFound { .. } => ErrorCode::InternalError,
        };
        Self::new(code, error.to_string())
    }
}

impl From<&ExchangeError> for EngineError {
    fn from(error: &ExchangeError) -> Self {
        match error {
            ExchangeError::NotFound(id) => Self::new(ErrorCode::OrderNotFound, error.to_string())
                .with_context("order_id", id.as_str()),
            ExchangeError::Conflict { status } => {
                Self::new(ErrorCode::InvalidOrderState, error.to_string())
                    .with_context("status", status.as_str())
            }
            ExchangeError::InvalidState(inner) => {
                Self::new(order_error_code(inner), error.to_string())
            }
        }
    }
}

impl From<&PositionError> for EngineError {
    fn from(error: &PositionError) -> Self {
        match error {
            PositionError::NoActiveSession => {
                Self::new(ErrorCode::NoActiveSession, error.to_string())
            }
            PositionError::EmptyFills(id) | PositionError::InvalidFillTotals(id) => {
                Self::new(ErrorCode::InvalidRequest, error.to_string())
                    .with_context("order_id", id.as_str())
            }
            PositionError::ForeignFill { .. } | PositionError::Domain(_) => {
                Self::new(ErrorCode::InvalidRequest, error.to_string())
            }
            PositionError::Store(inner) => Self::from(inner),
            PositionError::FlipOpenFailed { closed_id, .. } => {
                Self::new(ErrorCode::StoreUnavailable, error.to_string())
                    .with_context("closed_position_id", closed_id.as_str())
            }
        }
    }
}

impl<E> From<&RetryError<E>> for EngineError
where
    E: std::error::Error + 'static,
{
    fn from(error: &RetryError<E>) -> Self {
        let code = match error {
            RetryError::Terminal(_) => ErrorCode::InternalError,
            RetryError::Exhausted { .. } => ErrorCode::StoreUnavailable,
            RetryError::Cancelled { .. } => ErrorCode::Cancelled,
        };
        Self::new(code, error.to_string()).with_context("attempts", error.attempts().to_string())
    }
}

impl From<&ConfigError> for EngineError {
    fn from(error: &ConfigError) -> Self {
        Self::new(ErrorCode::InvalidConfig, error.to_string())
    }
}
