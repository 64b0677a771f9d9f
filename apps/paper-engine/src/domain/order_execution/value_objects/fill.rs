//! Execution fill produced by the simulator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{OrderId, Timestamp, TradeId};

/// Liquidity role of a fill, which selects the fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Liquidity {
    /// Resting order matched by someone else.
    Maker,
    /// Order matched immediately against resting liquidity.
    Taker,
}

/// Key identifying one fill of one order.
///
/// Used to make position reconciliation idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FillKey {
    /// Order the fill belongs to.
    pub order_id: OrderId,
    /// 0-based position of the fill within the order.
    pub sequence: u32,
}

/// A single immutable execution against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Order this fill belongs to.
    pub order_id: OrderId,
    /// 0-based sequence within the order.
    pub sequence: u32,
    /// Filled quantity.
    pub quantity: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Fee charged on this fill.
    pub fee: Decimal,
    /// Liquidity role.
    pub liquidity: Liquidity,
    /// Execution time.
    pub timestamp: Timestamp,
}

impl Fill {
    /// Create a new fill with zero fee.
    #[must_use]
    pub fn new(order_id: OrderId, sequence: u32, quantity: Decimal, price: Decimal) -> Self {
        Self {
            trade_id: TradeId::generate(),
            order_id,
            sequence,
            quantity,
            price,
            fee: Decimal::ZERO,
            liquidity: Liquidity::Taker,
            timestamp: Timestamp::now(),
        }
    }

    /// Set the fee and liquidity role.
    #[must_use]
    pub const fn with_fee(mut self, fee: Decimal, liquidity: Liquidity) -> Self {
        self.fee = fee;
        self.liquidity = liquidity;
        self
    }

    /// Notional value of the fill (`price * quantity`).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Idempotency key of the fill.
    #[must_use]
    pub fn key(&self) -> FillKey {
        FillKey {
            order_id: self.order_id.clone(),
            sequence: self.sequence,
        }
    }
}

/// Quantity-weighted average price of a set of fills.
///
/// Returns `None` when the total quantity is zero or the notional sum leaves
/// the `Decimal` range.
#[must_use]
pub fn weighted_average_price<'a, I>(fills: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a Fill>,
{
    let (notional, quantity) = fills.into_iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(n, q), f| {
            let notional = n.checked_add(f.price.checked_mul(f.quantity)?)?;
            Some((notional, q.checked_add(f.quantity)?))
        },
    )?;

    if quantity.is_zero() {
        None
    } else {
        notional.checked_div(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn notional_is_price_times_quantity() {
        let fill = Fill::new(OrderId::new("o-1"), 0, dec!(2), dec!(50.5));
        assert_eq!(fill.notional(), dec!(101.0));
    }

    #[test]
    fn average_of_oversized_fills_is_none() {
        let fills = [
            Fill::new(OrderId::new("o-1"), 0, Decimal::MAX, dec!(2)),
            Fill::new(OrderId::new("o-1"), 1, dec!(1), dec!(1)),
        ];
        assert_eq!(weighted_average_price(&fills), None);
    }

    #[test]
    fn key_uses_order_and_sequence() {
        let fill = Fill::new(OrderId::new("o-1"), 3, dec!(1), dec!(1));
        assert_eq!(
            fill.key(),
            FillKey {
                order_id: OrderId::new("o-1"),
                sequence: 3
            }
        );
    }

    #[test]
    fn weighted_average_leans_to_larger_fill() {
        let fills = vec![
            Fill::new(OrderId::new("o"), 0, dec!(3), dec!(100)),
            Fill::new(OrderId::new("o"), 1, dec!(1), dec!(104)),
        ];
        assert_eq!(weighted_average_price(&fills), Some(dec!(101)));
    }

    #[test]
    fn weighted_average_of_nothing_is_none() {
        let fills: Vec<Fill> = vec![];
        assert_eq!(weighted_average_price(&fills), None);
    }
}
