//! Typed error classification for retry decisions.
//!
//! Adapters report failures as an [`ErrorKind`]; [`classify`] turns the kind
//! into a retry decision.
//!
//! | Retryable | Terminal |
//! |-----------|----------|
//! | Connection refused / reset | Validation and business errors |
//! | Timeouts | 4xx other than 429 |
//! | Rate limits (429, -1003, -1015, 42910000) | Unknown exchange codes |
//! | 5xx server errors | Anything unrecognized |

use std::fmt;

/// Exchange error codes that indicate a transient condition.
///
/// -1001 disconnected, -1003 too many requests, -1007 backend timeout,
/// -1015 too many orders, -1021 timestamp outside the receive window.
pub const RETRYABLE_EXCHANGE_CODES: &[i64] = &[-1001, -1003, -1007, -1015, -1021];

/// Broker-specific rate limit code.
pub const BROKER_RATE_LIMIT_CODE: i64 = 42_910_000;

/// Words that mark the number after them as an HTTP status.
const STATUS_WORDS: &[&str] = &["status", "http", "https", "code"];

/// How far back a status word may sit, to cover `HTTP/1.1 503`.
const STATUS_LOOKBACK: usize = 3;

/// Whether the number at `index` reads as an HTTP status: it leads the
/// message, or a status word precedes it with only version digits between.
fn is_status_position(tokens: &[&str], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    for token in tokens[..index].iter().rev().take(STATUS_LOOKBACK) {
        if STATUS_WORDS.contains(token) {
            return true;
        }
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    false
}

/// Shape of a failure as reported by the adapter layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Peer refused the connection.
    ConnectionRefused,
    /// Connection dropped mid-request.
    ConnectionReset,
    /// Request or connect timeout.
    Timeout,
    /// Throttled by the remote side.
    RateLimited,
    /// HTTP-style status code returned by the remote side.
    ServerError(u16),
    /// Venue-specific numeric error code.
    ExchangeCode(i64),
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Map an untyped error message onto the vocabulary.
    ///
    /// Only for adapters that cannot report a typed kind.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("rate limit") || lower.contains("too many requests") {
            return Self::RateLimited;
        }
        if lower.contains("connection refused") {
            return Self::ConnectionRefused;
        }
        if lower.contains("connection reset") || lower.contains("broken pipe") {
            return Self::ConnectionReset;
        }
        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::Timeout;
        }

        let tokens: Vec<&str> = lower
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .filter(|token| !token.is_empty())
            .collect();
        for (index, token) in tokens.iter().enumerate() {
            let Ok(code) = token.parse::<i64>() else {
                continue;
            };
            if code == BROKER_RATE_LIMIT_CODE {
                return Self::RateLimited;
            }
            if RETRYABLE_EXCHANGE_CODES.contains(&code) {
                return Self::ExchangeCode(code);
            }
            if !is_status_position(&tokens, index) {
                continue;
            }
            if code == 429 {
                return Self::RateLimited;
            }
            if let Ok(status) = u16::try_from(code)
                && (500..600).contains(&status)
            {
                return Self::ServerError(status);
            }
        }

        Self::Other
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::ConnectionReset => write!(f, "connection reset"),
            Self::Timeout => write!(f, "timeout"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::ServerError(status) => write!(f, "server error {status}"),
            Self::ExchangeCode(code) => write!(f, "exchange error code {code}"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Retry decision for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    /// Transient; try again after backing off.
    Retryable,
    /// Permanent; return immediately.
    Terminal,
}

/// Classify an error kind.
#[must_use]
pub fn classify(kind: ErrorKind) -> Retryability {
    let retryable = match kind {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::Timeout
        | ErrorKind::RateLimited => true,
        ErrorKind::ServerError(status) => status == 429 || (500..600).contains(&status),
        ErrorKind::ExchangeCode(code) => {
            code == BROKER_RATE_LIMIT_CODE || RETRYABLE_EXCHANGE_CODES.contains(&code)
        }
        ErrorKind::Other => false,
    };

    if retryable {
        Retryability::Retryable
    } else {
        Retryability::Terminal
    }
}

/// Errors that know their own [`ErrorKind`].
pub trait Classify {
    /// Kind of this failure.
    fn error_kind(&self) -> ErrorKind;

    /// Retry decision for this failure.
    fn retryability(&self) -> Retryability {
        classify(self.error_kind())
    }
}

impl Classify for ErrorKind {
    fn error_kind(&self) -> ErrorKind {
        *self
    }
}

impl Classify for crate::application::ports::StoreError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(message) => ErrorKind::from_message(message),
            Self::NotFound { .. } | Self::Conflict(_) => ErrorKind::Other,
        }
    }
}

impl Classify for crate::execution::PositionError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Store(inner) => inner.error_kind(),
            _ => ErrorKind::Other,
        }
    }
}
