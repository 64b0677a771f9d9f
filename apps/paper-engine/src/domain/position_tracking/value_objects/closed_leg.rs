//! Record of a closed slice of a position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CloseReason, PositionSide};
use crate::domain::shared::{PositionId, Symbol, Timestamp};

/// A closed (fully or partially) slice of a position as persisted by the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedLeg {
    /// Id of the closed record.
    pub id: PositionId,
    /// Id of the position the slice was taken from.
    pub parent_id: PositionId,
    /// Symbol.
    pub symbol: Symbol,
    /// Direction of the closed slice.
    pub side: PositionSide,
    /// Entry price of the slice.
    pub entry_price: Decimal,
    /// Exit price of the slice.
    pub exit_price: Decimal,
    /// Closed quantity.
    pub quantity: Decimal,
    /// Fees charged against this slice.
    pub fees: Decimal,
    /// Net realized P&L.
    pub realized_pnl: Decimal,
    /// Why the slice was closed.
    pub reason: CloseReason,
    /// Close time.
    pub closed_at: Timestamp,
}
