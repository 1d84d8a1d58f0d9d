//! The single source of truth for whether a new position may open and at
//! what notional. Shared by reference between every `TradingEngine` and the
//! `OrderExecutor`; all mutation is serialized through one internal mutex.

use crate::error::{RiskError, RiskResult};
use crate::policy::RiskPolicy;
use helion_core::{EquityBook, Symbol};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

pub struct RiskManager {
    policy: RiskPolicy,
    book: Mutex<EquityBook>,
}

impl RiskManager {
    pub fn new(policy: RiskPolicy, starting_equity: Decimal) -> Self {
        Self {
            policy,
            book: Mutex::new(EquityBook::new(starting_equity)),
        }
    }

    /// `kelly_fraction = clip(kelly_coeff * confidence, 0, max_symbol_risk_pct)`
    /// — `confidence` stands in for the edge-over-reward term documented in
    /// the sizing formula, since the predictor already collapses edge into
    /// a single `[0, 1]` confidence score.
    /// `volatility_scale = min(1, vol_target_annual / annual_vol)`.
    /// Result is clamped to `[min_notional_usd, max_notional_usd]` and
    /// further to `equity_now * max_symbol_risk_pct`.
    pub fn position_size_usd(
        &self,
        _symbol: &Symbol,
        _prob_up: f64,
        confidence: f64,
        annual_vol: f64,
        equity_now: Decimal,
    ) -> Decimal {
        let kelly_coeff = self.policy.kelly_coeff.to_string().parse::<f64>().unwrap_or(0.25);
        let max_symbol_risk_pct = self
            .policy
            .max_symbol_risk_pct
            .to_string()
            .parse::<f64>()
            .unwrap_or(0.20);
        let vol_target = self
            .policy
            .vol_target_annual
            .to_string()
            .parse::<f64>()
            .unwrap_or(0.15);

        let kelly_fraction = (kelly_coeff * confidence).clamp(0.0, max_symbol_risk_pct);
        let volatility_scale = if annual_vol > 0.0 {
            (vol_target / annual_vol).min(1.0)
        } else {
            1.0
        };
        let confidence_scale = confidence;

        let fraction = kelly_fraction * volatility_scale * confidence_scale;
        let raw_size = Decimal::from_f64_retain(fraction).unwrap_or(Decimal::ZERO) * equity_now;

        let max_symbol_cap = equity_now * self.policy.max_symbol_risk_pct;
        raw_size
            .max(Decimal::ZERO)
            .min(max_symbol_cap)
            .clamp(self.policy.min_notional_usd, self.policy.max_notional_usd)
    }

    pub fn can_open_new_position(&self, _symbol: &Symbol) -> bool {
        let book = self.book.lock();
        if book.global_stop_engaged {
            return false;
        }
        book.positions_open < self.policy.max_concurrent_positions
    }

    pub fn on_order_filled(&self, symbol: &Symbol, opening: bool, notional: Decimal, realized_pnl: Decimal) {
        let mut book = self.book.lock();
        if opening {
            book.positions_open += 1;
        } else {
            book.positions_open = book.positions_open.saturating_sub(1);
        }
        info!(symbol = %symbol, %notional, %realized_pnl, opening, "order filled, equity book updated");
    }

    /// Updates `equity_now` and `realized_today_pct`; if the daily loss
    /// bound is breached, engages `global_stop_engaged` as a one-way latch
    /// for the rest of the day.
    pub fn on_position_closed(&self, symbol: &Symbol, realized_pnl: Decimal) {
        let mut book = self.book.lock();
        book.equity_now += realized_pnl;
        if !book.equity_start_day.is_zero() {
            book.realized_today_pct = (book.equity_now - book.equity_start_day) / book.equity_start_day;
        }

        let daily_loss_fraction = self.policy.max_daily_loss_pct / Decimal::from(100);
        if book.realized_today_pct <= -daily_loss_fraction {
            if !book.global_stop_engaged {
                warn!(symbol = %symbol, realized_today_pct = %book.realized_today_pct, "daily loss limit breached, global stop engaged");
            }
            book.global_stop_engaged = true;
        }
    }

    pub fn reset_day(&self) {
        let mut book = self.book.lock();
        book.reset_day();
        info!("risk book reset for new trading day");
    }

    pub fn summary(&self) -> EquityBook {
        self.book.lock().clone()
    }

    pub fn global_stop_engaged(&self) -> bool {
        self.book.lock().global_stop_engaged
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }
}

pub fn validate_policy(policy: &RiskPolicy) -> RiskResult<()> {
    policy.validate().map_err(RiskError::ConfigError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sym() -> Symbol {
        Symbol::new("BTC/USDT")
    }

    #[test]
    fn global_stop_latch_blocks_after_daily_loss_breached() {
        let manager = RiskManager::new(RiskPolicy::default(), dec!(10000));

        manager.on_position_closed(&sym(), dec!(-350));

        let summary = manager.summary();
        assert_eq!(summary.realized_today_pct, dec!(-0.035));
        assert!(summary.global_stop_engaged);
        assert!(!manager.can_open_new_position(&sym()));
    }

    #[test]
    fn exactly_at_max_concurrent_positions_blocks_next() {
        let manager = RiskManager::new(RiskPolicy::default(), dec!(10000));
        for _ in 0..manager.policy().max_concurrent_positions {
            manager.on_order_filled(&sym(), true, dec!(100), Decimal::ZERO);
        }
        assert!(!manager.can_open_new_position(&sym()));
    }

    #[test]
    fn reset_day_clears_latch_and_loss() {
        let manager = RiskManager::new(RiskPolicy::default(), dec!(10000));
        manager.on_position_closed(&sym(), dec!(-350));
        assert!(manager.global_stop_engaged());

        manager.reset_day();

        assert!(!manager.global_stop_engaged());
        assert_eq!(manager.summary().realized_today_pct, Decimal::ZERO);
    }

    #[test]
    fn position_size_clamped_to_notional_bounds() {
        let manager = RiskManager::new(RiskPolicy::default(), dec!(10000));
        let size = manager.position_size_usd(&sym(), 0.9, 1.0, 0.01, dec!(10000));
        assert!(size <= manager.policy().max_notional_usd);
        assert!(size >= manager.policy().min_notional_usd);
    }
}
