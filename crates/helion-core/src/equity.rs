//! The RiskManager's mutable portfolio accounting state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityBook {
    pub equity_start_day: Decimal,
    pub equity_now: Decimal,
    pub realized_today_pct: Decimal,
    pub positions_open: u32,
    pub global_stop_engaged: bool,
}

impl EquityBook {
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            equity_start_day: starting_equity,
            equity_now: starting_equity,
            realized_today_pct: Decimal::ZERO,
            positions_open: 0,
            global_stop_engaged: false,
        }
    }

    /// Daily reset atomically replaces `equity_start_day` with `equity_now`
    /// and zeroes `realized_today_pct`; the global-stop latch clears too.
    pub fn reset_day(&mut self) {
        self.equity_start_day = self.equity_now;
        self.realized_today_pct = Decimal::ZERO;
        self.global_stop_engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reset_day_clears_latch_and_rebases_start() {
        let mut book = EquityBook::new(dec!(10000));
        book.equity_now = dec!(9650);
        book.realized_today_pct = dec!(-0.035);
        book.global_stop_engaged = true;

        book.reset_day();

        assert_eq!(book.equity_start_day, dec!(9650));
        assert_eq!(book.realized_today_pct, Decimal::ZERO);
        assert!(!book.global_stop_engaged);
    }
}
