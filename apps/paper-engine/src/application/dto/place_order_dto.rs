//! Order placement DTOs
//!
//! Adapters hand the engine a loosely-typed [`PlaceOrderRequest`]. It is
//! validated once into an [`OrderTicket`] and the core never sees raw input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{Order, OrderSide, OrderStatus, OrderTicket, OrderType};
use crate::domain::shared::{OrderId, Symbol};

/// Order request as received from a protocol adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Symbol to trade.
    pub symbol: String,
    /// `buy` or `sell` (any case).
    pub side: String,
    /// `market` or `limit` (any case).
    #[serde(rename = "type")]
    pub order_type: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Limit price (required for limit orders).
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl PlaceOrderRequest {
    /// Validate into a typed ticket.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when any field is invalid.
    pub fn validate(&self) -> Result<OrderTicket, String> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err("symbol is required".to_string());
        }
        let side: OrderSide = self.side.parse()?;
        let order_type: OrderType = self.order_type.parse()?;

        let limit_price = match order_type {
            OrderType::Market => Decimal::ZERO,
            OrderType::Limit => self.price.unwrap_or(Decimal::ZERO),
        };

        let ticket = OrderTicket {
            symbol: Symbol::new(symbol),
            side,
            order_type,
            quantity: self.quantity,
            limit_price,
        };
        ticket.validate()?;
        Ok(ticket)
    }
}

/// Outcome of a placement attempt. Rejections are results, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderResult {
    /// Assigned id; `None` when rejected.
    pub order_id: Option<OrderId>,
    /// Status after placement.
    pub status: OrderStatus,
    /// Human-readable detail.
    pub message: String,
}

impl PlaceOrderResult {
    /// A rejected request.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            order_id: None,
            status: OrderStatus::Rejected,
            message: reason.into(),
        }
    }

    /// An accepted order in its post-placement status.
    #[must_use]
    pub fn accepted(order: &Order) -> Self {
        let message = match order.status() {
            OrderStatus::Filled => format!(
                "filled {} @ {}",
                order.filled_quantity(),
                order.average_fill_price()
            ),
            OrderStatus::Open => format!("resting at {}", order.limit_price()),
            other => format!("order {other}"),
        };
        Self {
            order_id: Some(order.id().clone()),
            status: order.status(),
            message,
        }
    }

    /// Returns true if the request was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status == OrderStatus::Rejected
    }
}
