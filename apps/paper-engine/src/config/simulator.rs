//! Exchange simulator configuration: fees, slippage and the fallback price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fee and slippage parameters of the simulated venue.
///
/// Defaults approximate a major crypto exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Fee rate for resting (maker) fills.
    #[serde(default = "default_maker_fee")]
    pub maker_fee: Decimal,
    /// Fee rate for immediately matched (taker) fills.
    #[serde(default = "default_taker_fee")]
    pub taker_fee: Decimal,
    /// Slippage applied to every market order.
    #[serde(default = "default_base_slippage")]
    pub base_slippage: Decimal,
    /// Extra slippage per 1,000,000 of notional.
    #[serde(default = "default_market_impact")]
    pub market_impact: Decimal,
    /// Upper bound on slippage.
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
    /// Reference price used for symbols without a market price.
    #[serde(default = "default_fallback_price")]
    pub fallback_price: Decimal,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            maker_fee: default_maker_fee(),
            taker_fee: default_taker_fee(),
            base_slippage: default_base_slippage(),
            market_impact: default_market_impact(),
            max_slippage: default_max_slippage(),
            fallback_price: default_fallback_price(),
        }
    }
}

fn default_maker_fee() -> Decimal {
    dec!(0.001)
}

fn default_taker_fee() -> Decimal {
    dec!(0.001)
}

fn default_base_slippage() -> Decimal {
    dec!(0.0005)
}

fn default_market_impact() -> Decimal {
    dec!(0.0001)
}

fn default_max_slippage() -> Decimal {
    dec!(0.003)
}

fn default_fallback_price() -> Decimal {
    dec!(100)
}
