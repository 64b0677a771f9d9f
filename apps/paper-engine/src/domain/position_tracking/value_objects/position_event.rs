//! Outcome of reconciling an order's fills against the open positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position_tracking::aggregate::Position;
use crate::domain::shared::PositionId;

/// Why a position (or a slice of it) was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    /// Opposite fill smaller than the open quantity.
    PartialClose,
    /// Opposite fill equal to the open quantity.
    FullClose,
    /// Opposite fill larger than the open quantity.
    Flip,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartialClose => write!(f, "PARTIAL_CLOSE"),
            Self::FullClose => write!(f, "FULL_CLOSE"),
            Self::Flip => write!(f, "FLIP"),
        }
    }
}

/// Lifecycle event produced by applying one order's fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionEvent {
    /// A new position was opened.
    Opened {
        /// The new position.
        position: Position,
    },
    /// Fills were added to a same-direction position.
    Averaged {
        /// The position after averaging.
        position: Position,
    },
    /// Part of an opposite-direction position was closed.
    PartiallyClosed {
        /// The remaining open position.
        position: Position,
        /// P&L realized on the closed slice.
        realized_pnl: Decimal,
    },
    /// An opposite-direction position was fully closed.
    Closed {
        /// Id of the closed position.
        position_id: PositionId,
        /// P&L realized on close.
        realized_pnl: Decimal,
    },
    /// A position was closed and a new one opened on the other side.
    Flipped {
        /// Id of the closed position.
        closed_id: PositionId,
        /// P&L realized on the closed position.
        realized_pnl: Decimal,
        /// The position opened from the excess quantity.
        opened: Position,
    },
    /// Every fill of the order had already been applied.
    Duplicate,
}

impl PositionEvent {
    /// Realized P&L carried by the event, if any.
    #[must_use]
    pub const fn realized_pnl(&self) -> Option<Decimal> {
        match self {
            Self::PartiallyClosed { realized_pnl, .. }
            | Self::Closed { realized_pnl, .. }
            | Self::Flipped { realized_pnl, .. } => Some(*realized_pnl),
            Self::Opened { .. } | Self::Averaged { .. } | Self::Duplicate => None,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "opened",
            Self::Averaged { .. } => "averaged",
            Self::PartiallyClosed { .. } => "partially_closed",
            Self::Closed { .. } => "closed",
            Self::Flipped { .. } => "flipped",
            Self::Duplicate => "duplicate",
        }
    }
}
