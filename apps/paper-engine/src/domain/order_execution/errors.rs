//! Order execution errors.

use rust_decimal::Decimal;
use thiserror::Error;

use super::value_objects::OrderStatus;

/// Errors that can occur when driving an order through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Invalid state transition attempted.
    #[error("invalid order state transition: {from} -> {to}: {reason}")]
    InvalidStateTransition {
        /// Current order status.
        from: OrderStatus,
        /// Attempted status.
        to: OrderStatus,
        /// Reason for failure.
        reason: String,
    },

    /// Order cannot be cancelled in its current state.
    #[error("cannot cancel order in status: {status}")]
    CannotCancel {
        /// Current status.
        status: OrderStatus,
    },

    /// Fills do not add up to the order quantity.
    #[error("fill quantity {filled} does not match order quantity {quantity}")]
    QuantityMismatch {
        /// Sum of fill quantities.
        filled: Decimal,
        /// Order quantity.
        quantity: Decimal,
    },

    /// Fill count outside of the allowed range.
    #[error("invalid fill count {count}, expected 1..={max}")]
    InvalidFillCount {
        /// Number of fills supplied.
        count: usize,
        /// Maximum fills per order.
        max: usize,
    },

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParameters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_cancel_names_status() {
        let err = OrderError::CannotCancel {
            status: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "cannot cancel order in status: CANCELLED");
    }

    #[test]
    fn invalid_transition_display() {
        let err = OrderError::InvalidStateTransition {
            from: OrderStatus::Filled,
            to: OrderStatus::Open,
            reason: "already filled".to_string(),
        };
        assert!(err.to_string().contains("FILLED -> OPEN"));
    }
}
