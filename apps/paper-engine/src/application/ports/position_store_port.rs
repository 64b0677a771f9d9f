//! Position Store Port (Driven Port)
//!
//! Persistence used by the position manager. Unlike order persistence these
//! calls are load-bearing: an error aborts the in-memory mutation.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::StoreError;
use crate::domain::position_tracking::{CloseReason, ClosedLeg, Position};
use crate::domain::shared::{PositionId, SessionId};

/// Port for position persistence.
#[async_trait]
pub trait PositionStorePort: Send + Sync {
    /// Open positions of a session.
    async fn get_open_positions(&self, session_id: &SessionId)
    -> Result<Vec<Position>, StoreError>;

    /// Persist a newly opened position.
    async fn create_position(&self, position: &Position) -> Result<(), StoreError>;

    /// Close a position entirely, returning the realized P&L net of fees.
    async fn close_position(
        &self,
        id: &PositionId,
        exit_price: Decimal,
        reason: CloseReason,
        fees: Decimal,
    ) -> Result<Decimal, StoreError>;

    /// Close `quantity` of a position, returning the closed slice.
    async fn partial_close_position(
        &self,
        id: &PositionId,
        quantity: Decimal,
        exit_price: Decimal,
        reason: CloseReason,
        fees: Decimal,
    ) -> Result<ClosedLeg, StoreError>;

    /// Persist a same-direction add.
    async fn update_position_averaging(
        &self,
        id: &PositionId,
        new_entry_price: Decimal,
        new_quantity: Decimal,
        fees_delta: Decimal,
    ) -> Result<(), StoreError>;

    /// Persist a mark-to-market.
    async fn update_unrealized_pnl(
        &self,
        id: &PositionId,
        current_price: Decimal,
    ) -> Result<(), StoreError>;
}
