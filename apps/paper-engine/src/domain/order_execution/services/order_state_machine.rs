//! Order State Machine Service
//!
//! Validates status transitions of simulated orders.

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::value_objects::OrderStatus;

/// Order State Machine for validating transitions.
///
/// ```text
/// Pending -> Filled      (market order simulated)
/// Pending -> Open        (limit order resting)
/// Pending -> Cancelled
/// Open    -> Filled      (resting order matched)
/// Open    -> Cancelled
/// ```
///
/// `Rejected` is never reached by a stored order.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (
                OrderStatus::Pending,
                OrderStatus::Open | OrderStatus::Filled | OrderStatus::Cancelled
            ) | (OrderStatus::Open, OrderStatus::Filled | OrderStatus::Cancelled)
        )
    }

    /// Validate a state transition.
    ///
    /// Cancel attempts from a non-cancelable status map to
    /// [`OrderError::CannotCancel`] so the message names the current status.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            return Ok(());
        }
        if to == OrderStatus::Cancelled {
            return Err(OrderError::CannotCancel { status: from });
        }
        Err(OrderError::InvalidStateTransition {
            from,
            to,
            reason: Self::transition_error_reason(from, to),
        })
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: OrderStatus, to: OrderStatus) -> String {
        match from {
            OrderStatus::Filled => format!("order is already filled, cannot transition to {to}"),
            OrderStatus::Cancelled => format!("order is cancelled, cannot transition to {to}"),
            OrderStatus::Rejected => format!("order was rejected, cannot transition to {to}"),
            _ => format!("invalid transition from {from} to {to}"),
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderStatus) -> Vec<OrderStatus> {
        match from {
            OrderStatus::Pending => vec![
                OrderStatus::Open,
                OrderStatus::Filled,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Open => vec![OrderStatus::Filled, OrderStatus::Cancelled],
            // Terminal states
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected => vec![],
        }
    }
}
