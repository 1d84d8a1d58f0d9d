//! The tunable bounds the `RiskManager` enforces.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub max_daily_loss_pct: Decimal,
    pub max_symbol_risk_pct: Decimal,
    pub max_concurrent_positions: u32,
    pub vol_target_annual: Decimal,
    pub kelly_coeff: Decimal,
    pub min_notional_usd: Decimal,
    pub max_notional_usd: Decimal,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: dec!(3.0),
            max_symbol_risk_pct: dec!(0.20),
            max_concurrent_positions: 5,
            vol_target_annual: dec!(0.15),
            kelly_coeff: dec!(0.25),
            min_notional_usd: dec!(5),
            max_notional_usd: dec!(250),
        }
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_notional_usd > self.max_notional_usd {
            return Err(format!(
                "min_notional_usd ({}) exceeds max_notional_usd ({})",
                self.min_notional_usd, self.max_notional_usd
            ));
        }
        if self.max_concurrent_positions == 0 {
            return Err("max_concurrent_positions must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        RiskPolicy::default().validate().unwrap();
    }

    #[test]
    fn inverted_notional_bounds_reject() {
        let mut policy = RiskPolicy::default();
        policy.min_notional_usd = dec!(300);
        assert!(policy.validate().is_err());
    }
}
