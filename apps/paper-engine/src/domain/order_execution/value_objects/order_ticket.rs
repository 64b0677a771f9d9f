//! Validated order parameters.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{OrderSide, OrderType};
use crate::domain::shared::Symbol;

/// Largest `quantity * price` a single order may carry.
///
/// Keeps fill, fee and P&L arithmetic well inside the `Decimal` range.
pub const MAX_ORDER_NOTIONAL: Decimal = dec!(1000000000000000000);

/// `quantity * price` if it stays within [`MAX_ORDER_NOTIONAL`].
#[must_use]
pub fn bounded_notional(quantity: Decimal, price: Decimal) -> Option<Decimal> {
    quantity
        .checked_mul(price)
        .filter(|notional| notional.abs() <= MAX_ORDER_NOTIONAL)
}

/// Strongly-typed, already validated order parameters.
///
/// Built at the boundary from a `PlaceOrderRequest`; the simulator never sees
/// unvalidated input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    /// Symbol to trade (non-empty).
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity (> 0).
    pub quantity: Decimal,
    /// Limit price; zero for market orders, > 0 for limit orders.
    pub limit_price: Decimal,
}

impl OrderTicket {
    /// Build a market order ticket.
    #[must_use]
    pub fn market(symbol: impl Into<Symbol>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: Decimal::ZERO,
        }
    }

    /// Build a limit order ticket.
    #[must_use]
    pub fn limit(
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price,
        }
    }

    /// Check the order invariants.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the ticket is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.is_blank() {
            return Err("symbol is required".to_string());
        }
        if self.quantity <= Decimal::ZERO {
            return Err(format!("quantity must be positive, got {}", self.quantity));
        }
        if self.order_type.requires_limit_price() {
            if self.limit_price <= Decimal::ZERO {
                return Err("limit orders require a positive price".to_string());
            }
            if bounded_notional(self.quantity, self.limit_price).is_none() {
                return Err(format!("order notional exceeds {MAX_ORDER_NOTIONAL}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_ticket_is_valid() {
        let ticket = OrderTicket::market("BTCUSDT", OrderSide::Buy, dec!(0.1));
        assert!(ticket.validate().is_ok());
        assert_eq!(ticket.limit_price, Decimal::ZERO);
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let ticket = OrderTicket::market(" ", OrderSide::Buy, dec!(1));
        assert!(ticket.validate().unwrap_err().contains("symbol"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let ticket = OrderTicket::market("BTCUSDT", OrderSide::Sell, dec!(0));
        assert!(ticket.validate().unwrap_err().contains("quantity"));
    }

    #[test]
    fn limit_without_price_is_rejected() {
        let ticket = OrderTicket::limit("BTCUSDT", OrderSide::Sell, dec!(1), dec!(0));
        assert!(ticket.validate().unwrap_err().contains("price"));
    }

    #[test]
    fn oversized_limit_notional_is_rejected() {
        let ticket = OrderTicket::limit(
            "BTCUSDT",
            OrderSide::Buy,
            dec!(1000000000000000),
            dec!(1000000000000000),
        );
        assert!(ticket.validate().unwrap_err().contains("notional"));
    }

    #[test]
    fn notional_bound_is_inclusive() {
        assert_eq!(
            bounded_notional(dec!(1000000000), dec!(1000000000)),
            Some(MAX_ORDER_NOTIONAL)
        );
        assert_eq!(bounded_notional(Decimal::MAX, dec!(2)), None);
        assert_eq!(bounded_notional(dec!(1000000001), dec!(1000000000)), None);
    }
}
