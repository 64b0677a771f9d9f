//! Deterministic fill synthesis for simulated market orders.
//!
//! Slippage grows linearly with notional up to a cap. Orders of one unit or
//! more are split into up to five fills that walk the price further in the
//! adverse direction, approximating consumption of order book depth. There is
//! no randomness: the same inputs always produce the same fills.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SimulatorConfig;
use crate::domain::order_execution::{
    Fill, Liquidity, MAX_FILLS_PER_ORDER, MAX_ORDER_NOTIONAL, OrderError, OrderSide,
    bounded_notional,
};
use crate::domain::shared::OrderId;

/// Notional unit for the market impact coefficient.
const IMPACT_NOTIONAL_UNIT: Decimal = dec!(1000000);

/// Extra adverse price move per successive fill (0.01%).
const DEPTH_STEP: Decimal = dec!(0.0001);

/// Share of the remaining quantity taken by the first fill.
const FIRST_FILL_FRACTION: Decimal = dec!(0.2);

/// Growth of that share per fill (`0.2 / 5`).
const FILL_FRACTION_STEP: Decimal = dec!(0.04);

/// Pure fill model built from the simulator configuration.
#[derive(Debug, Clone)]
pub struct FillModel {
    config: SimulatorConfig,
}

impl FillModel {
    /// Create a fill model.
    #[must_use]
    pub const fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// `min(base + impact * notional / 1,000,000, max)`.
    ///
    /// Returns `None` when the notional exceeds [`MAX_ORDER_NOTIONAL`].
    #[must_use]
    pub fn slippage(&self, quantity: Decimal, mid: Decimal) -> Option<Decimal> {
        let notional = bounded_notional(quantity, mid)?;
        let impact = self
            .config
            .market_impact
            .checked_mul(notional / IMPACT_NOTIONAL_UNIT)?;
        let slippage = self.config.base_slippage.checked_add(impact)?;
        Some(slippage.min(self.config.max_slippage))
    }

    /// Price band every fill must fall into: `mid * (1 ± max_slippage)`.
    #[must_use]
    pub fn price_bounds(&self, mid: Decimal) -> Option<(Decimal, Decimal)> {
        Some((
            mid.checked_mul(Decimal::ONE - self.config.max_slippage)?,
            mid.checked_mul(Decimal::ONE + self.config.max_slippage)?,
        ))
    }

    /// Move `price` against the order by `fraction`.
    fn adverse(side: OrderSide, price: Decimal, fraction: Decimal) -> Option<Decimal> {
        match side {
            OrderSide::Buy => price.checked_mul(Decimal::ONE + fraction),
            OrderSide::Sell => price.checked_mul(Decimal::ONE - fraction),
        }
    }

    /// Fee charged on `notional` for the given liquidity role.
    #[must_use]
    pub fn fee(&self, notional: Decimal, liquidity: Liquidity) -> Option<Decimal> {
        let rate = match liquidity {
            Liquidity::Maker => self.config.maker_fee,
            Liquidity::Taker => self.config.taker_fee,
        };
        notional.checked_mul(rate)
    }

    /// Synthesize the fills of a market order against reference price `mid`.
    ///
    /// Quantities sum exactly to `quantity`; prices are clamped into
    /// [`price_bounds`](Self::price_bounds).
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` when `quantity * mid` exceeds
    /// [`MAX_ORDER_NOTIONAL`].
    pub fn simulate_market(
        &self,
        order_id: &OrderId,
        side: OrderSide,
        quantity: Decimal,
        mid: Decimal,
    ) -> Result<Vec<Fill>, OrderError> {
        let out_of_range = || {
            OrderError::InvalidParameters(format!(
                "notional of {quantity} at {mid} exceeds {MAX_ORDER_NOTIONAL}"
            ))
        };
        let slippage = self.slippage(quantity, mid).ok_or_else(out_of_range)?;
        let base_price = Self::adverse(side, mid, slippage).ok_or_else(out_of_range)?;
        let (low, high) = self.price_bounds(mid).ok_or_else(out_of_range)?;

        if quantity < Decimal::ONE {
            let fill = self.taker_fill(order_id, 0, quantity, base_price.clamp(low, high));
            return fill.map(|f| vec![f]).ok_or_else(out_of_range);
        }

        let mut fills = Vec::with_capacity(MAX_FILLS_PER_ORDER);
        let mut remaining = quantity;
        for index in 0..MAX_FILLS_PER_ORDER {
            let step = Decimal::from(index);
            let fill_qty = if index + 1 == MAX_FILLS_PER_ORDER {
                remaining
            } else {
                remaining * (FIRST_FILL_FRACTION + FILL_FRACTION_STEP * step)
            };
            let price = Self::adverse(side, base_price, DEPTH_STEP * step)
                .ok_or_else(out_of_range)?
                .clamp(low, high);
            let sequence = u32::try_from(index).unwrap_or(u32::MAX);

            let fill = self
                .taker_fill(order_id, sequence, fill_qty, price)
                .ok_or_else(out_of_range)?;
            fills.push(fill);
            remaining -= fill_qty;
        }

        tracing::debug!(
            order_id = %order_id,
            %side,
            %quantity,
            %mid,
            %slippage,
            fills = fills.len(),
            "synthesized market fills"
        );
        Ok(fills)
    }

    /// Single maker fill for a resting limit order matched at `price`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` when the fill notional exceeds
    /// [`MAX_ORDER_NOTIONAL`].
    pub fn resting_fill(
        &self,
        order_id: &OrderId,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Fill, OrderError> {
        bounded_notional(quantity, price)
            .and_then(|notional| self.fee(notional, Liquidity::Maker))
            .map(|fee| {
                Fill::new(order_id.clone(), 0, quantity, price).with_fee(fee, Liquidity::Maker)
            })
            .ok_or_else(|| {
                OrderError::InvalidParameters(format!(
                    "notional of {quantity} at {price} exceeds {MAX_ORDER_NOTIONAL}"
                ))
            })
    }

    fn taker_fill(
        &self,
        order_id: &OrderId,
        sequence: u32,
        quantity: Decimal,
        price: Decimal,
    ) -> Option<Fill> {
        let fee = self.fee(price.checked_mul(quantity)?, Liquidity::Taker)?;
        Some(Fill::new(order_id.clone(), sequence, quantity, price).with_fee(fee, Liquidity::Taker))
    }
}

impl Default for FillModel {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}
