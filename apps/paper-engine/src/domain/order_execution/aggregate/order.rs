//! Order Aggregate Root
//!
//! The Order aggregate owns the lifecycle of one simulated order. All status
//! changes go through [`OrderStateMachine`], so an order can never leave a
//! terminal status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::services::OrderStateMachine;
use crate::domain::order_execution::value_objects::{
    Fill, OrderSide, OrderStatus, OrderTicket, OrderType, weighted_average_price,
};
use crate::domain::shared::{OrderId, SessionId, Symbol, Timestamp};

/// Maximum number of fills synthesized for a single order.
pub const MAX_FILLS_PER_ORDER: usize = 5;

/// Order aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    session_id: Option<SessionId>,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Decimal,
    limit_price: Decimal,
    filled_quantity: Decimal,
    average_fill_price: Decimal,
    status: OrderStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
    filled_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
}

impl Order {
    /// Create a new `Pending` order from a validated ticket.
    ///
    /// # Errors
    ///
    /// Returns error if the ticket violates the order invariants.
    pub fn new(ticket: OrderTicket, session_id: Option<SessionId>) -> Result<Self, OrderError> {
        ticket.validate().map_err(OrderError::InvalidParameters)?;

        let now = Timestamp::now();
        Ok(Self {
            id: OrderId::generate(),
            session_id,
            symbol: ticket.symbol,
            side: ticket.side,
            order_type: ticket.order_type,
            quantity: ticket.quantity,
            limit_price: ticket.limit_price,
            filled_quantity: Decimal::ZERO,
            average_fill_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            filled_at: None,
            cancelled_at: None,
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the order ID.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Session the order was placed in, if any.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Get the limit price (zero for market orders).
    #[must_use]
    pub const fn limit_price(&self) -> Decimal {
        self.limit_price
    }

    /// Cumulative filled quantity.
    #[must_use]
    pub const fn filled_quantity(&self) -> Decimal {
        self.filled_quantity
    }

    /// Quantity-weighted average fill price (zero until filled).
    #[must_use]
    pub const fn average_fill_price(&self) -> Decimal {
        self.average_fill_price
    }

    /// Filled notional (`filled_quantity * average_fill_price`).
    #[must_use]
    pub fn filled_quote_quantity(&self) -> Decimal {
        self.filled_quantity * self.average_fill_price
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Time the order was filled.
    #[must_use]
    pub const fn filled_at(&self) -> Option<Timestamp> {
        self.filled_at
    }

    /// Time the order was cancelled.
    #[must_use]
    pub const fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Rest a limit order on the simulated book.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not `Pending`.
    pub fn open(&mut self) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, OrderStatus::Open)?;
        self.status = OrderStatus::Open;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Complete the order with its fills.
    ///
    /// The fills must belong to this order and add up to exactly the order
    /// quantity.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid or the fills break the
    /// filled-order invariants.
    pub fn fill(&mut self, fills: &[Fill]) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, OrderStatus::Filled)?;

        if fills.is_empty() || fills.len() > MAX_FILLS_PER_ORDER {
            return Err(OrderError::InvalidFillCount {
                count: fills.len(),
                max: MAX_FILLS_PER_ORDER,
            });
        }
        if let Some(foreign) = fills.iter().find(|f| f.order_id != self.id) {
            return Err(OrderError::InvalidParameters(format!(
                "fill for order {} applied to order {}",
                foreign.order_id, self.id
            )));
        }

        let filled = fills
            .iter()
            .try_fold(Decimal::ZERO, |total, f| total.checked_add(f.quantity))
            .ok_or_else(|| {
                OrderError::InvalidParameters("fill quantities overflow".to_string())
            })?;
        if filled != self.quantity {
            return Err(OrderError::QuantityMismatch {
                filled,
                quantity: self.quantity,
            });
        }
        let average = weighted_average_price(fills).ok_or_else(|| {
            OrderError::InvalidParameters("fill notional is out of range".to_string())
        })?;

        let now = Timestamp::now();
        self.filled_quantity = filled;
        self.average_fill_price = average;
        self.status = OrderStatus::Filled;
        self.updated_at = now;
        self.filled_at = Some(now);
        Ok(())
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::CannotCancel`] unless the order is `Pending` or
    /// `Open`.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, OrderStatus::Cancelled)?;

        let now = Timestamp::now();
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
        self.cancelled_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market_order(qty: Decimal) -> Order {
        Order::new(OrderTicket::market("BTCUSDT", OrderSide::Buy, qty), None).unwrap()
    }

    fn limit_order() -> Order {
        Order::new(
            OrderTicket::limit("BTCUSDT", OrderSide::Sell, dec!(0.05), dec!(51000)),
            Some(SessionId::new("s-1")),
        )
        .unwrap()
    }

    #[test]
    fn new_order_is_pending() {
        let order = market_order(dec!(1));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.filled_quantity(), Decimal::ZERO);
        assert!(order.filled_at().is_none());
        assert!(order.session_id().is_none());
    }

    #[test]
    fn new_order_rejects_invalid_ticket() {
        let result = Order::new(OrderTicket::market("", OrderSide::Buy, dec!(1)), None);
        assert!(matches!(result, Err(OrderError::InvalidParameters(_))));
    }

    #[test]
    fn fill_sets_weighted_average() {
        let mut order = market_order(dec!(4));
        let fills = vec![
            Fill::new(order.id().clone(), 0, dec!(3), dec!(100)),
            Fill::new(order.id().clone(), 1, dec!(1), dec!(104)),
        ];
        order.fill(&fills).unwrap();

        assert_eq!(order.status(), OrderStatus::Filled);
        assert_eq!(order.filled_quantity(), dec!(4));
        assert_eq!(order.average_fill_price(), dec!(101));
        assert_eq!(order.filled_quote_quantity(), dec!(404));
        assert!(order.filled_at().is_some());
    }

    #[test]
    fn fill_rejects_short_quantity() {
        let mut order = market_order(dec!(4));
        let fills = vec![Fill::new(order.id().clone(), 0, dec!(3), dec!(100))];
        let err = order.fill(&fills).unwrap_err();
        assert!(matches!(err, OrderError::QuantityMismatch { .. }));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn fill_rejects_too_many_fills() {
        let mut order = market_order(dec!(6));
        let fills: Vec<Fill> = (0..6)
            .map(|i| Fill::new(order.id().clone(), i, dec!(1), dec!(100)))
            .collect();
        assert!(matches!(
            order.fill(&fills),
            Err(OrderError::InvalidFillCount { count: 6, .. })
        ));
    }

    #[test]
    fn fill_rejects_foreign_fills() {
        let mut order = market_order(dec!(1));
        let fills = vec![Fill::new(OrderId::new("other"), 0, dec!(1), dec!(100))];
        assert!(order.fill(&fills).is_err());
    }

    #[test]
    fn open_then_cancel() {
        let mut order = limit_order();
        order.open().unwrap();
        assert_eq!(order.status(), OrderStatus::Open);

        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(order.cancelled_at().is_some());
    }

    #[test]
    fn cancel_twice_names_current_status() {
        let mut order = limit_order();
        order.open().unwrap();
        order.cancel().unwrap();

        let err = order.cancel().unwrap_err();
        assert_eq!(err.to_string(), "cannot cancel order in status: CANCELLED");
    }

    #[test]
    fn cannot_cancel_filled_order() {
        let mut order = market_order(dec!(1));
        let fills = vec![Fill::new(order.id().clone(), 0, dec!(1), dec!(100))];
        order.fill(&fills).unwrap();

        assert_eq!(
            order.cancel().unwrap_err(),
            OrderError::CannotCancel {
                status: OrderStatus::Filled
            }
        );
    }

    #[test]
    fn resting_order_can_fill() {
        let mut order = limit_order();
        order.open().unwrap();
        let fills = vec![Fill::new(order.id().clone(), 0, dec!(0.05), dec!(51000))];
        order.fill(&fills).unwrap();
        assert_eq!(order.average_fill_price(), dec!(51000));
    }
}
