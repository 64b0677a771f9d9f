//! Decides which lifecycle rule an incoming fill triggers.

use rust_decimal::Decimal;

use crate::domain::position_tracking::aggregate::Position;
use crate::domain::position_tracking::value_objects::PositionSide;

/// The single rule applied to an open position for one order's fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No open position: open one.
    Open,
    /// Same direction: blend into the open position.
    Average,
    /// Opposite direction, smaller than the open quantity.
    PartialClose,
    /// Opposite direction, exactly the open quantity.
    Close,
    /// Opposite direction, larger than the open quantity.
    Flip {
        /// Quantity left over for the new position.
        remainder: Decimal,
    },
}

/// Stateless planner for position reconciliation.
pub struct PositionReconciler;

impl PositionReconciler {
    /// Pick the action for `quantity` in direction `incoming`.
    #[must_use]
    pub fn plan(
        existing: Option<&Position>,
        incoming: PositionSide,
        quantity: Decimal,
    ) -> ReconcileAction {
        let Some(open) = existing else {
            return ReconcileAction::Open;
        };

        if open.side() == incoming {
            return ReconcileAction::Average;
        }

        match quantity.cmp(&open.quantity()) {
            std::cmp::Ordering::Less => ReconcileAction::PartialClose,
            std::cmp::Ordering::Equal => ReconcileAction::Close,
            std::cmp::Ordering::Greater => ReconcileAction::Flip {
                remainder: quantity - open.quantity(),
            },
        }
    }
}
