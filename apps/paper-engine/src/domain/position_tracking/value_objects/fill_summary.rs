//! Aggregate view of an order's fills.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{Fill, weighted_average_price};

/// Total quantity, weighted price and fee of a batch of fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSummary {
    /// Sum of fill quantities.
    pub quantity: Decimal,
    /// Quantity-weighted average price.
    pub average_price: Decimal,
    /// Sum of `price * quantity`.
    pub notional: Decimal,
    /// `notional * fee_rate`.
    pub fee: Decimal,
}

impl FillSummary {
    /// Summarize fills, charging `fee_rate` on the notional.
    ///
    /// Returns `None` if the fills carry no quantity or their notional does
    /// not fit in a `Decimal`.
    #[must_use]
    pub fn from_fills(fills: &[Fill], fee_rate: Decimal) -> Option<Self> {
        let average_price = weighted_average_price(fills)?;
        let (quantity, notional) =
            fills
                .iter()
                .try_fold((Decimal::ZERO, Decimal::ZERO), |(q, n), f| {
                    Some((
                        q.checked_add(f.quantity)?,
                        n.checked_add(f.price.checked_mul(f.quantity)?)?,
                    ))
                })?;

        Some(Self {
            quantity,
            average_price,
            notional,
            fee: notional.checked_mul(fee_rate)?,
        })
    }

    /// Fee attributable to `part` of the summarized quantity.
    #[must_use]
    pub fn fee_share(&self, part: Decimal) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.fee * part / self.quantity
        }
    }
}
