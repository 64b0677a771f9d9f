//! Order Store Port (Driven Port)
//!
//! Persistence used by the exchange simulator. Calls are best-effort: the
//! simulator logs failures and carries on.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::domain::order_execution::{Fill, Order, OrderStatus};
use crate::domain::shared::{OrderId, Timestamp};

/// Status change of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    /// Order being updated.
    pub order_id: OrderId,
    /// New status.
    pub status: OrderStatus,
    /// Cumulative filled quantity.
    pub filled_quantity: Decimal,
    /// Cumulative filled notional.
    pub filled_quote_quantity: Decimal,
    /// Fill time, if filled.
    pub filled_at: Option<Timestamp>,
    /// Cancel time, if cancelled.
    pub cancelled_at: Option<Timestamp>,
    /// Error detail, if any.
    pub error_message: Option<String>,
}

impl From<&Order> for OrderStatusUpdate {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id().clone(),
            status: order.status(),
            filled_quantity: order.filled_quantity(),
            filled_quote_quantity: order.filled_quote_quantity(),
            filled_at: order.filled_at(),
            cancelled_at: order.cancelled_at(),
            error_message: None,
        }
    }
}

/// Port for order and trade persistence.
#[async_trait]
pub trait OrderStorePort: Send + Sync {
    /// Persist a newly placed order.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Persist a status change.
    async fn update_order_status(&self, update: &OrderStatusUpdate) -> Result<(), StoreError>;

    /// Persist one fill as a trade.
    async fn insert_trade(&self, fill: &Fill) -> Result<(), StoreError>;
}
