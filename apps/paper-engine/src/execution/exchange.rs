//! Order-execution simulator.
//!
//! Validates, stores and fills simulated orders. All state sits behind one
//! reader/writer lock: placing a market order creates the order, synthesizes
//! its fills and records them in a single write section, so no reader ever
//! sees a filled order without its fills.
//!
//! Persistence is best-effort. Store calls run after the state lock is
//! released and failures are logged, never returned. Mutations hold a
//! separate async writer lock until their store calls finish, so the store
//! sees each order's writes in the order they happened in memory.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::dto::{PlaceOrderRequest, PlaceOrderResult};
use crate::application::ports::{OrderStatusUpdate, OrderStorePort};
use crate::config::SimulatorConfig;
use crate::domain::order_execution::{Fill, Order, OrderError, OrderStatus, OrderTicket, OrderType};
use crate::domain::shared::{OrderId, SessionId, Symbol};

use super::fill_model::FillModel;

/// Errors returned by exchange lookups and transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Unknown order id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// Cancel requested on an order that is no longer cancelable.
    #[error("cannot cancel order in status: {status}")]
    Conflict {
        /// Current status of the order.
        status: OrderStatus,
    },

    /// Any other illegal transition.
    #[error(transparent)]
    InvalidState(#[from] OrderError),
}

#[derive(Debug, Default)]
struct ExchangeState {
    orders: HashMap<OrderId, Order>,
    fills: HashMap<OrderId, Vec<Fill>>,
    prices: HashMap<Symbol, Decimal>,
    session: Option<SessionId>,
}

/// Writes to run against the store once the lock is released.
#[derive(Debug, Default)]
struct PendingWrites {
    created: Option<Order>,
    update: Option<OrderStatusUpdate>,
    trades: Vec<Fill>,
}

/// Simulated exchange.
pub struct Exchange<S: OrderStorePort> {
    state: RwLock<ExchangeState>,
    /// Held from a mutation's state change until its writes are stored.
    writer: Mutex<()>,
    model: FillModel,
    store: Arc<S>,
}

impl<S: OrderStorePort> Exchange<S> {
    /// Create an exchange with the given simulator configuration and store.
    #[must_use]
    pub fn new(config: SimulatorConfig, store: Arc<S>) -> Self {
        Self {
            state: RwLock::new(ExchangeState::default()),
            writer: Mutex::new(()),
            model: FillModel::new(config),
            store,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ExchangeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ExchangeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the fill model.
    #[must_use]
    pub const fn fill_model(&self) -> &FillModel {
        &self.model
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Validate and place an order.
    ///
    /// Invalid requests come back as `Rejected` results and are never stored.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> PlaceOrderResult {
        match request.validate() {
            Ok(ticket) => self.place_ticket(ticket).await,
            Err(reason) => {
                tracing::info!(symbol = %request.symbol, %reason, "order rejected");
                PlaceOrderResult::rejected(reason)
            }
        }
    }

    /// Place an already validated order.
    ///
    /// Market orders are filled before this returns; limit orders rest as
    /// `Open`.
    pub async fn place_ticket(&self, ticket: OrderTicket) -> PlaceOrderResult {
        let _writer = self.writer.lock().await;
        let (result, writes) = {
            let mut state = self.write();
            let mut order = match Order::new(ticket, state.session.clone()) {
                Ok(order) => order,
                Err(e) => return PlaceOrderResult::rejected(e.to_string()),
            };
            let mut writes = PendingWrites {
                created: Some(order.clone()),
                ..PendingWrites::default()
            };

            let transition = match order.order_type() {
                OrderType::Market => {
                    let mid = self.reference_price(&state, order.symbol());
                    self.model
                        .simulate_market(order.id(), order.side(), order.quantity(), mid)
                        .and_then(|fills| order.fill(&fills).map(|()| fills))
                }
                OrderType::Limit => order.open().map(|()| Vec::new()),
            };
            let fills = match transition {
                Ok(fills) => fills,
                Err(e) => {
                    tracing::error!(order_id = %order.id(), error = %e, "order transition failed");
                    return PlaceOrderResult::rejected(e.to_string());
                }
            };

            tracing::info!(
                order_id = %order.id(),
                symbol = %order.symbol(),
                side = %order.side(),
                order_type = %order.order_type(),
                quantity = %order.quantity(),
                status = %order.status(),
                avg_price = %order.average_fill_price(),
                "order placed"
            );

            writes.update = Some(OrderStatusUpdate::from(&order));
            writes.trades.clone_from(&fills);
            state.fills.insert(order.id().clone(), fills);
            let result = PlaceOrderResult::accepted(&order);
            state.orders.insert(order.id().clone(), order);
            (result, writes)
        };

        self.persist(writes).await;
        result
    }

    /// Cancel a `Pending` or `Open` order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `Conflict` naming the current
    /// status when the order is already terminal.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, ExchangeError> {
        let _writer = self.writer.lock().await;
        let cancelled = {
            let mut state = self.write();
            let order = state
                .orders
                .get_mut(order_id)
                .ok_or_else(|| ExchangeError::NotFound(order_id.clone()))?;
            order.cancel().map_err(|e| match e {
                OrderError::CannotCancel { status } => ExchangeError::Conflict { status },
                other => ExchangeError::InvalidState(other),
            })?;
            order.clone()
        };

        tracing::info!(order_id = %order_id, symbol = %cancelled.symbol(), "order cancelled");
        self.persist(PendingWrites {
            update: Some(OrderStatusUpdate::from(&cancelled)),
            ..PendingWrites::default()
        })
        .await;
        Ok(cancelled)
    }

    /// Match a resting limit order at its limit price with a single maker
    /// fill.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `InvalidState` if the order is
    /// not resting.
    pub async fn fill_resting_order(
        &self,
        order_id: &OrderId,
    ) -> Result<(Order, Vec<Fill>), ExchangeError> {
        let _writer = self.writer.lock().await;
        let (order, fills) = {
            let mut state = self.write();
            let order = state
                .orders
                .get_mut(order_id)
                .ok_or_else(|| ExchangeError::NotFound(order_id.clone()))?;
            if order.status() != OrderStatus::Open {
                return Err(ExchangeError::InvalidState(
                    OrderError::InvalidStateTransition {
                        from: order.status(),
                        to: OrderStatus::Filled,
                        reason: "only resting orders can be matched".to_string(),
                    },
                ));
            }

            let fill = self
                .model
                .resting_fill(order.id(), order.quantity(), order.limit_price())?;
            let fills = vec![fill];
            order.fill(&fills)?;
            let snapshot = order.clone();
            state.fills.insert(order_id.clone(), fills.clone());
            (snapshot, fills)
        };

        tracing::info!(
            order_id = %order_id,
            symbol = %order.symbol(),
            price = %order.average_fill_price(),
            "resting order matched"
        );
        self.persist(PendingWrites {
            created: None,
            update: Some(OrderStatusUpdate::from(&order)),
            trades: fills.clone(),
        })
        .await;
        Ok((order, fills))
    }

    /// Look up an order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn get_order(&self, order_id: &OrderId) -> Result<Order, ExchangeError> {
        self.read()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| ExchangeError::NotFound(order_id.clone()))
    }

    /// Fills of an order; empty if it has none yet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn get_order_fills(&self, order_id: &OrderId) -> Result<Vec<Fill>, ExchangeError> {
        let state = self.read();
        if !state.orders.contains_key(order_id) {
            return Err(ExchangeError::NotFound(order_id.clone()));
        }
        Ok(state.fills.get(order_id).cloned().unwrap_or_default())
    }

    /// All orders, oldest first.
    #[must_use]
    pub fn list_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.read().orders.values().cloned().collect();
        orders.sort_by_key(Order::created_at);
        orders
    }

    /// Orders that can still be cancelled, optionally for one symbol.
    #[must_use]
    pub fn open_orders(&self, symbol: Option<&Symbol>) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .values()
            .filter(|o| o.status().is_cancelable())
            .filter(|o| symbol.is_none_or(|s| o.symbol() == s))
            .cloned()
            .collect();
        orders.sort_by_key(Order::created_at);
        orders
    }

    // ========================================================================
    // Market data and session
    // ========================================================================

    /// Set the reference price used by future market orders.
    pub fn set_market_price(&self, symbol: impl Into<Symbol>, price: Decimal) {
        let symbol = symbol.into();
        if price <= Decimal::ZERO {
            tracing::warn!(%symbol, %price, "ignoring non-positive market price");
            return;
        }
        self.write().prices.insert(symbol, price);
    }

    /// Last reference price set for `symbol`.
    #[must_use]
    pub fn market_price(&self, symbol: &Symbol) -> Option<Decimal> {
        self.read().prices.get(symbol).copied()
    }

    fn reference_price(&self, state: &ExchangeState, symbol: &Symbol) -> Decimal {
        state.prices.get(symbol).copied().unwrap_or_else(|| {
            let fallback = self.model.config().fallback_price;
            tracing::warn!(%symbol, %fallback, "no market price set, using fallback");
            fallback
        })
    }

    /// Set or clear the session stamped on new orders.
    pub fn set_session(&self, session: Option<SessionId>) {
        tracing::info!(session = ?session, "exchange session changed");
        self.write().session = session;
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.read().session.clone()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    async fn persist(&self, writes: PendingWrites) {
        if let Some(order) = writes.created
            && let Err(e) = self.store.insert_order(&order).await
        {
            tracing::warn!(order_id = %order.id(), error = %e, "failed to persist order");
        }
        if let Some(update) = writes.update
            && let Err(e) = self.store.update_order_status(&update).await
        {
            tracing::warn!(
                order_id = %update.order_id,
                status = %update.status,
                error = %e,
                "failed to persist order status"
            );
        }
        for fill in &writes.trades {
            if let Err(e) = self.store.insert_trade(fill).await {
                tracing::warn!(
                    order_id = %fill.order_id,
                    sequence = fill.sequence,
                    error = %e,
                    "failed to persist trade"
                );
            }
        }
    }
}
