//! Order status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status of a simulated order.
///
/// `Rejected` is only ever returned to the caller of `place_order`; a request
/// that fails validation never becomes a stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created and validated, no fill path executed yet.
    Pending,
    /// Limit order resting, waiting for an external match.
    Open,
    /// Order completely filled.
    Filled,
    /// Order cancelled.
    Cancelled,
    /// Request failed validation.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    /// Returns true if the order can be cancelled.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        matches!(self, Self::Pending | Self::Open)
    }

    /// Status string as stored by the persistence layer.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Open => "OPEN",
            Self::Filled => "FILLED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_is_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Open.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn order_status_is_cancelable() {
        assert!(OrderStatus::Pending.is_cancelable());
        assert!(OrderStatus::Open.is_cancelable());
        assert!(!OrderStatus::Filled.is_cancelable());
        assert!(!OrderStatus::Cancelled.is_cancelable());
    }

    #[test]
    fn order_status_display() {
        assert_eq!(format!("{}", OrderStatus::Cancelled), "CANCELLED");
        assert_eq!(format!("{}", OrderStatus::Filled), "FILLED");
    }

    #[test]
    fn order_status_serde() {
        let json = serde_json::to_string(&OrderStatus::Open).unwrap();
        assert_eq!(json, "\"OPEN\"");
    }
}
