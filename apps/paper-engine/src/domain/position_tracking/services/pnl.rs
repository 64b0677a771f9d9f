//! Signed P&L and entry price arithmetic.

use rust_decimal::Decimal;

use crate::domain::position_tracking::value_objects::PositionSide;

/// Gross P&L of `quantity` moved from `entry` to `exit`.
///
/// Long gains when price rises, short gains when price falls.
#[must_use]
pub fn gross_pnl(side: PositionSide, entry: Decimal, exit: Decimal, quantity: Decimal) -> Decimal {
    match side {
        PositionSide::Long => (exit - entry) * quantity,
        PositionSide::Short => (entry - exit) * quantity,
    }
}

/// Volume-weighted entry price after adding `add_qty` at `add_price`.
#[must_use]
pub fn weighted_entry_price(
    old_price: Decimal,
    old_qty: Decimal,
    add_price: Decimal,
    add_qty: Decimal,
) -> Decimal {
    let total = old_qty + add_qty;
    if total.is_zero() {
        return add_price;
    }
    (old_price * old_qty + add_price * add_qty) / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn long_gains_when_price_rises() {
        assert_eq!(
            gross_pnl(PositionSide::Long, dec!(100), dec!(150), dec!(0.1)),
            dec!(5.0)
        );
        assert_eq!(
            gross_pnl(PositionSide::Long, dec!(100), dec!(90), dec!(1)),
            dec!(-10)
        );
    }

    #[test]
    fn short_gains_when_price_falls() {
        assert_eq!(
            gross_pnl(PositionSide::Short, dec!(3000), dec!(2800), dec!(1)),
            dec!(200)
        );
        assert_eq!(
            gross_pnl(PositionSide::Short, dec!(3000), dec!(3100), dec!(1)),
            dec!(-100)
        );
    }

    #[test]
    fn weighted_entry_leans_to_larger_quantity() {
        let price = weighted_entry_price(dec!(100), dec!(10), dec!(110), dec!(5));
        assert!(price > dec!(100) && price < dec!(110));
        assert!(price < dec!(105));
        assert_eq!(price.round_dp(2), dec!(103.33));
    }
}
