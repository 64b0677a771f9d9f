//! Position reconciliation engine.
//!
//! Consumes `(order, fills)` pairs and applies exactly one lifecycle rule per
//! order: open, average, partial close, full close or flip.
//!
//! Locking: one `tokio::sync::RwLock` guards the position book and is held
//! across store calls, so mutations are serialized with their persistence.
//! Every mutation writes to the store first and touches memory only on
//! success. `update_unrealized_pnl` takes the write lock as well.
//!
//! Idempotency: fills are keyed by `(order_id, sequence)`. Keys already
//! applied are skipped, so a replayed hand-off cannot double-count.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::application::ports::{PositionStorePort, StoreError};
use crate::config::SimulatorConfig;
use crate::domain::order_execution::{Fill, FillKey, Order, OrderType};
use crate::domain::position_tracking::{
    CloseReason, FillSummary, Position, PositionDomainError, PositionEvent, PositionReconciler,
    PositionSide, ReconcileAction,
};
use crate::domain::shared::{OrderId, PositionId, SessionId, Symbol};

/// Errors returned by the position manager.
#[derive(Debug, Error)]
pub enum PositionError {
    /// No session is set.
    #[error("no active session")]
    NoActiveSession,

    /// `on_order_filled` was called without fills.
    #[error("no fills supplied for order {0}")]
    EmptyFills(OrderId),

    /// The fills sum to zero quantity or a notional outside the `Decimal`
    /// range.
    #[error("fills of order {0} have no quantity or an out-of-range notional")]
    InvalidFillTotals(OrderId),

    /// A fill belongs to another order.
    #[error("fill for order {fill_order} supplied with order {order}")]
    ForeignFill {
        /// Order passed in.
        order: OrderId,
        /// Order named by the fill.
        fill_order: OrderId,
    },

    /// The position aggregate rejected the change.
    #[error(transparent)]
    Domain(#[from] PositionDomainError),

    /// The store rejected the change; memory is unchanged.
    #[error("position store error: {0}")]
    Store(#[from] StoreError),

    /// A flip closed the old position but the replacement was not stored.
    ///
    /// The close stands in memory and in the store; the fills are recorded
    /// as applied.
    #[error("flip closed position {closed_id} but failed to open {remainder}: {source}")]
    FlipOpenFailed {
        /// Closed position.
        closed_id: PositionId,
        /// P&L realized by the close.
        realized_pnl: Decimal,
        /// Quantity that should have been opened.
        remainder: Decimal,
        /// Store failure.
        source: StoreError,
    },
}

/// Fee rates applied to reconciled fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Rate for limit orders.
    pub maker_fee: Decimal,
    /// Rate for market orders.
    pub taker_fee: Decimal,
}

impl FeeSchedule {
    /// Fee rate for an order type.
    #[must_use]
    pub const fn rate_for(&self, order_type: OrderType) -> Decimal {
        match order_type {
            OrderType::Market => self.taker_fee,
            OrderType::Limit => self.maker_fee,
        }
    }
}

impl From<&SimulatorConfig> for FeeSchedule {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            maker_fee: config.maker_fee,
            taker_fee: config.taker_fee,
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::from(&SimulatorConfig::default())
    }
}

#[derive(Debug, Default)]
struct PositionBook {
    session: Option<SessionId>,
    positions: HashMap<Symbol, Position>,
    /// Fill keys applied in the current session.
    applied: HashSet<FillKey>,
}

/// Position reconciliation engine.
pub struct PositionManager<S: PositionStorePort> {
    book: RwLock<PositionBook>,
    store: Arc<S>,
    fees: FeeSchedule,
}

impl<S: PositionStorePort> PositionManager<S> {
    /// Create a manager with no active session.
    #[must_use]
    pub fn new(fees: FeeSchedule, store: Arc<S>) -> Self {
        Self {
            book: RwLock::new(PositionBook::default()),
            store,
            fees,
        }
    }

    /// Get the fee schedule.
    #[must_use]
    pub const fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Switch session scope.
    ///
    /// `Some` reloads that session's open positions from the store,
    /// replacing the in-memory set; `None` clears it. Applied fill keys are
    /// forgotten whenever the session changes and kept when the same session
    /// is reloaded.
    ///
    /// # Errors
    ///
    /// Returns `Store` if loading fails; the previous scope is kept.
    pub async fn set_session(&self, session: Option<SessionId>) -> Result<(), PositionError> {
        let mut book = self.book.write().await;

        let Some(session_id) = session else {
            book.session = None;
            book.positions.clear();
            book.applied.clear();
            tracing::info!("position session cleared");
            return Ok(());
        };

        let loaded = self.store.get_open_positions(&session_id).await?;
        let mut positions = HashMap::with_capacity(loaded.len());
        for position in loaded {
            let symbol = position.symbol().clone();
            if let Some(previous) = positions.insert(symbol.clone(), position) {
                tracing::warn!(
                    %symbol,
                    dropped = %previous.id(),
                    "multiple open positions for symbol, keeping the last loaded"
                );
            }
        }

        tracing::info!(session = %session_id, positions = positions.len(), "position session loaded");
        if book.session.as_ref() != Some(&session_id) {
            book.applied.clear();
        }
        book.session = Some(session_id);
        book.positions = positions;
        Ok(())
    }

    /// Current session.
    pub async fn session(&self) -> Option<SessionId> {
        self.book.read().await.session.clone()
    }

    /// Apply an order's fills to the open positions.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` without a session, `EmptyFills` for an empty
    /// batch, `InvalidFillTotals` when the fills cannot be summed and `Store`
    /// when persistence fails (memory left unchanged).
    pub async fn on_order_filled(
        &self,
        order: &Order,
        fills: &[Fill],
    ) -> Result<PositionEvent, PositionError> {
        if fills.is_empty() {
            return Err(PositionError::EmptyFills(order.id().clone()));
        }
        if let Some(foreign) = fills.iter().find(|f| &f.order_id != order.id()) {
            return Err(PositionError::ForeignFill {
                order: order.id().clone(),
                fill_order: foreign.order_id.clone(),
            });
        }

        let mut book = self.book.write().await;
        let session = book.session.clone().ok_or(PositionError::NoActiveSession)?;

        let fresh: Vec<Fill> = fills
            .iter()
            .filter(|f| !book.applied.contains(&f.key()))
            .cloned()
            .collect();
        if fresh.is_empty() {
            tracing::info!(order_id = %order.id(), "fills already applied, skipping");
            return Ok(PositionEvent::Duplicate);
        }

        let summary = FillSummary::from_fills(&fresh, self.fees.rate_for(order.order_type()))
            .ok_or_else(|| PositionError::InvalidFillTotals(order.id().clone()))?;
        let incoming = PositionSide::from(order.side());
        let symbol = order.symbol().clone();

        let outcome = self
            .reconcile(&mut book, &session, &symbol, incoming, &summary)
            .await;

        if matches!(&outcome, Ok(_) | Err(PositionError::FlipOpenFailed { .. })) {
            book.applied.extend(fresh.iter().map(Fill::key));
        }

        match &outcome {
            Ok(event) => tracing::info!(
                order_id = %order.id(),
                %symbol,
                event = event.kind(),
                quantity = %summary.quantity,
                price = %summary.average_price,
                fee = %summary.fee,
                realized_pnl = ?event.realized_pnl(),
                "position updated"
            ),
            Err(e) => tracing::warn!(
                order_id = %order.id(),
                %symbol,
                error = %e,
                "position update failed"
            ),
        }
        outcome
    }

    async fn reconcile(
        &self,
        book: &mut PositionBook,
        session: &SessionId,
        symbol: &Symbol,
        incoming: PositionSide,
        summary: &FillSummary,
    ) -> Result<PositionEvent, PositionError> {
        let existing = book.positions.get(symbol).cloned();
        let action = PositionReconciler::plan(existing.as_ref(), incoming, summary.quantity);

        match (action, existing) {
            (ReconcileAction::Open, _) | (_, None) => {
                let position = Position::open(
                    session.clone(),
                    symbol.clone(),
                    incoming,
                    summary.average_price,
                    summary.quantity,
                    summary.fee,
                )?;
                self.store.create_position(&position).await?;
                book.positions.insert(symbol.clone(), position.clone());
                Ok(PositionEvent::Opened { position })
            }
            (ReconcileAction::Average, Some(open)) => {
                let mut next = open;
                next.average_in(summary.average_price, summary.quantity, summary.fee)?;
                self.store
                    .update_position_averaging(
                        next.id(),
                        next.entry_price(),
                        next.quantity(),
                        summary.fee,
                    )
                    .await?;
                book.positions.insert(symbol.clone(), next.clone());
                Ok(PositionEvent::Averaged { position: next })
            }
            (ReconcileAction::PartialClose, Some(open)) => {
                let mut next = open.clone();
                next.reduce(summary.quantity, summary.fee)?;
                let leg = self
                    .store
                    .partial_close_position(
                        open.id(),
                        summary.quantity,
                        summary.average_price,
                        CloseReason::PartialClose,
                        summary.fee,
                    )
                    .await?;
                book.positions.insert(symbol.clone(), next.clone());
                Ok(PositionEvent::PartiallyClosed {
                    position: next,
                    realized_pnl: leg.realized_pnl,
                })
            }
            (ReconcileAction::Close, Some(open)) => {
                let realized_pnl = self
                    .store
                    .close_position(
                        open.id(),
                        summary.average_price,
                        CloseReason::FullClose,
                        summary.fee,
                    )
                    .await?;
                book.positions.remove(symbol);
                Ok(PositionEvent::Closed {
                    position_id: open.id().clone(),
                    realized_pnl,
                })
            }
            (ReconcileAction::Flip { remainder }, Some(open)) => {
                let close_fee = summary.fee_share(open.quantity());
                let open_fee = summary.fee - close_fee;
                let replacement = Position::open(
                    session.clone(),
                    symbol.clone(),
                    incoming,
                    summary.average_price,
                    remainder,
                    open_fee,
                )?;

                let realized_pnl = self
                    .store
                    .close_position(open.id(), summary.average_price, CloseReason::Flip, close_fee)
                    .await?;
                book.positions.remove(symbol);

                if let Err(source) = self.store.create_position(&replacement).await {
                    tracing::error!(
                        %symbol,
                        closed = %open.id(),
                        %remainder,
                        error = %source,
                        "flip closed position but could not open the replacement"
                    );
                    return Err(PositionError::FlipOpenFailed {
                        closed_id: open.id().clone(),
                        realized_pnl,
                        remainder,
                        source,
                    });
                }

                book.positions.insert(symbol.clone(), replacement.clone());
                Ok(PositionEvent::Flipped {
                    closed_id: open.id().clone(),
                    realized_pnl,
                    opened: replacement,
                })
            }
        }
    }

    /// Mark open positions to the supplied prices.
    ///
    /// Positions without a price are left untouched. Each position is
    /// persisted before its in-memory mark changes.
    ///
    /// # Errors
    ///
    /// Returns the first store failure; positions marked before it stay
    /// marked.
    pub async fn update_unrealized_pnl(
        &self,
        prices: &HashMap<Symbol, Decimal>,
    ) -> Result<(), PositionError> {
        let mut book = self.book.write().await;
        for (symbol, position) in &mut book.positions {
            let Some(price) = prices.get(symbol).copied() else {
                continue;
            };
            self.store.update_unrealized_pnl(position.id(), price).await?;
            let unrealized = position.mark(price);
            tracing::debug!(%symbol, %price, %unrealized, "position marked");
        }
        Ok(())
    }

    /// Open positions of the current session, ordered by symbol.
    pub async fn get_open_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> =
            self.book.read().await.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        positions
    }

    /// Open position for a symbol.
    pub async fn get_position(&self, symbol: &Symbol) -> Option<Position> {
        self.book.read().await.positions.get(symbol).cloned()
    }

    /// Open position by id.
    pub async fn get_position_by_id(&self, id: &PositionId) -> Option<Position> {
        self.book
            .read()
            .await
            .positions
            .values()
            .find(|p| p.id() == id)
            .cloned()
    }

    /// Sum of the last marks over open positions.
    pub async fn get_total_unrealized_pnl(&self) -> Decimal {
        self.book
            .read()
            .await
            .positions
            .values()
            .filter_map(Position::unrealized_pnl)
            .sum()
    }
}
