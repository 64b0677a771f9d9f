//! In-memory trade store.
//!
//! Implements both persistence ports for tests, demos and the standalone
//! binary. Realized P&L is computed here, the way a relational backend would
//! compute it on close. Open fees are charged against the first closed leg
//! and never again.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{OrderStatusUpdate, OrderStorePort, PositionStorePort, StoreError};
use crate::domain::order_execution::{Fill, Order};
use crate::domain::position_tracking::services::pnl;
use crate::domain::position_tracking::{
    CloseReason, ClosedLeg, Position, ReconstitutedPositionParams,
};
use crate::domain::shared::{OrderId, PositionId, SessionId, Timestamp};

/// Store operations that can be made to fail once via
/// [`InMemoryTradeStore::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `insert_order`
    InsertOrder,
    /// `update_order_status`
    UpdateOrderStatus,
    /// `insert_trade`
    InsertTrade,
    /// `get_open_positions`
    GetOpenPositions,
    /// `create_position`
    CreatePosition,
    /// `close_position`
    ClosePosition,
    /// `partial_close_position`
    PartialClosePosition,
    /// `update_position_averaging`
    UpdatePositionAveraging,
    /// `update_unrealized_pnl`
    UpdateUnrealizedPnl,
}

#[derive(Debug, Clone)]
struct StoredPosition {
    position: Position,
    /// Part of `position.fees()` already deducted from a closed leg.
    fees_charged: Decimal,
}

#[derive(Debug, Default)]
struct TradeStoreState {
    orders: HashMap<OrderId, Order>,
    statuses: HashMap<OrderId, OrderStatusUpdate>,
    trades: Vec<Fill>,
    open: HashMap<PositionId, StoredPosition>,
    closed: Vec<ClosedLeg>,
    failures: HashSet<StoreOperation>,
}

impl TradeStoreState {
    fn check(&mut self, op: StoreOperation) -> Result<(), StoreError> {
        if self.failures.remove(&op) {
            return Err(StoreError::Unavailable(format!("injected failure in {op:?}")));
        }
        Ok(())
    }

    fn open_position(&mut self, id: &PositionId) -> Result<&mut StoredPosition, StoreError> {
        self.open.get_mut(id).ok_or_else(|| StoreError::NotFound {
            entity: "position",
            id: id.to_string(),
        })
    }
}

/// In-memory implementation of [`OrderStorePort`] and [`PositionStorePort`].
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    state: Mutex<TradeStoreState>,
}

impl InMemoryTradeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TradeStoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `op` fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, op: StoreOperation) {
        self.lock().failures.insert(op);
    }

    /// Insert an open position directly (for test setup).
    pub fn seed_position(&self, position: Position) {
        self.lock().open.insert(
            position.id().clone(),
            StoredPosition {
                position,
                fees_charged: Decimal::ZERO,
            },
        );
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Number of stored trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.lock().trades.len()
    }

    /// Last persisted status of an order.
    #[must_use]
    pub fn order_status(&self, order_id: &OrderId) -> Option<OrderStatusUpdate> {
        self.lock().statuses.get(order_id).cloned()
    }

    /// Trades of one order, in insertion order.
    #[must_use]
    pub fn trades_for(&self, order_id: &OrderId) -> Vec<Fill> {
        self.lock()
            .trades
            .iter()
            .filter(|f| &f.order_id == order_id)
            .cloned()
            .collect()
    }

    /// A stored open position.
    #[must_use]
    pub fn stored_position(&self, id: &PositionId) -> Option<Position> {
        self.lock().open.get(id).map(|s| s.position.clone())
    }

    /// Number of open positions across all sessions.
    #[must_use]
    pub fn open_position_count(&self) -> usize {
        self.lock().open.len()
    }

    /// Closed legs, oldest first.
    #[must_use]
    pub fn closed_legs(&self) -> Vec<ClosedLeg> {
        self.lock().closed.clone()
    }

    /// Sum of realized P&L over all closed legs.
    #[must_use]
    pub fn total_realized_pnl(&self) -> Decimal {
        self.lock().closed.iter().map(|leg| leg.realized_pnl).sum()
    }
}

#[async_trait]
impl OrderStorePort for InMemoryTradeStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::InsertOrder)?;
        if state.orders.contains_key(order.id()) {
            return Err(StoreError::Conflict(format!("duplicate order {}", order.id())));
        }
        state.orders.insert(order.id().clone(), order.clone());
        Ok(())
    }

    async fn update_order_status(&self, update: &OrderStatusUpdate) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::UpdateOrderStatus)?;
        if !state.orders.contains_key(&update.order_id) {
            return Err(StoreError::NotFound {
                entity: "order",
                id: update.order_id.to_string(),
            });
        }
        state.statuses.insert(update.order_id.clone(), update.clone());
        Ok(())
    }

    async fn insert_trade(&self, fill: &Fill) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::InsertTrade)?;
        state.trades.push(fill.clone());
        Ok(())
    }
}

#[async_trait]
impl PositionStorePort for InMemoryTradeStore {
    async fn get_open_positions(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Position>, StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::GetOpenPositions)?;
        Ok(state
            .open
            .values()
            .filter(|s| s.position.session_id() == session_id)
            .map(|s| s.position.clone())
            .collect())
    }

    async fn create_position(&self, position: &Position) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::CreatePosition)?;
        if state.open.contains_key(position.id()) {
            return Err(StoreError::Conflict(format!(
                "duplicate position {}",
                position.id()
            )));
        }
        state.open.insert(
            position.id().clone(),
            StoredPosition {
                position: position.clone(),
                fees_charged: Decimal::ZERO,
            },
        );
        Ok(())
    }

    async fn close_position(
        &self,
        id: &PositionId,
        exit_price: Decimal,
        reason: CloseReason,
        fees: Decimal,
    ) -> Result<Decimal, StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::ClosePosition)?;
        let stored = state.open.remove(id).ok_or_else(|| StoreError::NotFound {
            entity: "position",
            id: id.to_string(),
        })?;

        let position = stored.position;
        let unpaid_fees = position.fees() + fees - stored.fees_charged;
        let gross = pnl::gross_pnl(
            position.side(),
            position.entry_price(),
            exit_price,
            position.quantity(),
        );
        let realized_pnl = gross - unpaid_fees;

        state.closed.push(ClosedLeg {
            id: position.id().clone(),
            parent_id: position.id().clone(),
            symbol: position.symbol().clone(),
            side: position.side(),
            entry_price: position.entry_price(),
            exit_price,
            quantity: position.quantity(),
            fees: unpaid_fees,
            realized_pnl,
            reason,
            closed_at: Timestamp::now(),
        });
        Ok(realized_pnl)
    }

    async fn partial_close_position(
        &self,
        id: &PositionId,
        quantity: Decimal,
        exit_price: Decimal,
        reason: CloseReason,
        fees: Decimal,
    ) -> Result<ClosedLeg, StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::PartialClosePosition)?;
        let stored = state.open_position(id)?;

        stored
            .position
            .reduce(quantity, fees)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;
        let unpaid_fees = stored.position.fees() - stored.fees_charged;
        stored.fees_charged = stored.position.fees();

        let position = &stored.position;
        let gross = pnl::gross_pnl(position.side(), position.entry_price(), exit_price, quantity);
        let leg = ClosedLeg {
            id: PositionId::generate(),
            parent_id: position.id().clone(),
            symbol: position.symbol().clone(),
            side: position.side(),
            entry_price: position.entry_price(),
            exit_price,
            quantity,
            fees: unpaid_fees,
            realized_pnl: gross - unpaid_fees,
            reason,
            closed_at: Timestamp::now(),
        };
        state.closed.push(leg.clone());
        Ok(leg)
    }

    async fn update_position_averaging(
        &self,
        id: &PositionId,
        new_entry_price: Decimal,
        new_quantity: Decimal,
        fees_delta: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::UpdatePositionAveraging)?;
        let stored = state.open_position(id)?;

        let old = &stored.position;
        stored.position = Position::reconstitute(ReconstitutedPositionParams {
            id: old.id().clone(),
            session_id: old.session_id().clone(),
            symbol: old.symbol().clone(),
            side: old.side(),
            entry_price: new_entry_price,
            quantity: new_quantity,
            entry_time: old.entry_time(),
            fees: old.fees() + fees_delta,
            unrealized_pnl: old.unrealized_pnl(),
        });
        Ok(())
    }

    async fn update_unrealized_pnl(
        &self,
        id: &PositionId,
        current_price: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check(StoreOperation::UpdateUnrealizedPnl)?;
        state.open_position(id)?.position.mark(current_price);
        Ok(())
    }
}
