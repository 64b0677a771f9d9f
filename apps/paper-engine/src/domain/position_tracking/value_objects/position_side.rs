//! Position direction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_execution::OrderSide;

/// Direction of a position. Quantity is always positive; direction lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// Gains when price rises.
    Long,
    /// Gains when price falls.
    Short,
}

impl PositionSide {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl From<OrderSide> for PositionSide {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => Self::Long,
            OrderSide::Sell => Self::Short,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_implies_long() {
        assert_eq!(PositionSide::from(OrderSide::Buy), PositionSide::Long);
        assert_eq!(PositionSide::from(OrderSide::Sell), PositionSide::Short);
    }

    #[test]
    fn opposite_side() {
        assert_eq!(PositionSide::Long.opposite(), PositionSide::Short);
        assert_eq!(PositionSide::Short.opposite(), PositionSide::Long);
    }
}
