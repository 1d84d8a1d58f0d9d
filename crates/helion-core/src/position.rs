//! Per-symbol position accounting, computed from executed orders.

use crate::{order::OrderSide, Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Size,
    pub avg_entry_price: Price,
    pub unrealized_pnl: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            quantity: Size::ZERO,
            avg_entry_price: Price::ZERO,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn side(&self) -> Option<OrderSide> {
        if self.is_flat() {
            None
        } else if self.quantity.inner().is_sign_positive() {
            Some(OrderSide::Buy)
        } else {
            Some(OrderSide::Sell)
        }
    }

    pub fn notional(&self, mark_price: Price) -> Decimal {
        self.quantity.inner().abs() * mark_price.inner()
    }

    /// Folds one fill into the position: same-direction fills extend the
    /// position at a size-weighted average entry price; opposite-direction
    /// fills reduce (and may flip) it. `unrealized_pnl` is left untouched —
    /// it is recomputed against the current mark price elsewhere, not here.
    pub fn apply_fill(&mut self, side: OrderSide, fill_qty: Size, fill_price: Price) {
        let signed_fill = fill_qty.inner().abs() * Decimal::from(i32::from(side.sign()));
        let new_qty = self.quantity.inner() + signed_fill;

        let same_direction = self.quantity.inner().is_zero()
            || self.quantity.inner().signum() == signed_fill.signum();

        self.avg_entry_price = if same_direction && !new_qty.is_zero() {
            let old_notional = self.quantity.inner().abs() * self.avg_entry_price.inner();
            let fill_notional = signed_fill.abs() * fill_price.inner();
            Price::new((old_notional + fill_notional) / new_qty.abs())
        } else if new_qty.is_zero() {
            Price::ZERO
        } else {
            // flipped through flat: the residual opens a fresh position.
            fill_price
        };

        self.quantity = Size::new(new_qty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_position_has_no_side() {
        assert_eq!(Position::flat().side(), None);
    }

    #[test]
    fn long_position_notional_is_absolute() {
        let pos = Position {
            quantity: Size::new(dec!(2)),
            avg_entry_price: Price::new(dec!(100)),
            unrealized_pnl: Decimal::ZERO,
        };
        assert_eq!(pos.notional(Price::new(dec!(110))), dec!(220));
        assert_eq!(pos.side(), Some(OrderSide::Buy));
    }
}
