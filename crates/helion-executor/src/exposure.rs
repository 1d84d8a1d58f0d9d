//! Tracks per-symbol notional exposure so `Execute` can enforce the
//! portfolio-wide exposure limit. A minimal stand-in for the "portfolio"
//! collaborator the executor's pipeline consults — real fill-driven
//! portfolio sync happens out of core scope; this tracker is updated
//! optimistically on successful submission.

use dashmap::DashMap;
use helion_core::Symbol;
use rust_decimal::Decimal;

#[derive(Default)]
pub struct ExposureTracker {
    notional_by_symbol: DashMap<Symbol, Decimal>,
}

impl ExposureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exposure_notional(&self, symbol: &Symbol, _price_hint: helion_core::Price) -> Decimal {
        self.notional_by_symbol
            .get(symbol)
            .map(|v| *v)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn add(&self, symbol: &Symbol, notional: Decimal) {
        *self
            .notional_by_symbol
            .entry(symbol.clone())
            .or_insert(Decimal::ZERO) += notional;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_core::Price;
    use rust_decimal_macros::dec;

    #[test]
    fn exposure_accumulates_per_symbol() {
        let tracker = ExposureTracker::new();
        let sym = Symbol::new("BTC/USDT");
        tracker.add(&sym, dec!(100));
        tracker.add(&sym, dec!(50));
        assert_eq!(tracker.exposure_notional(&sym, Price::new(dec!(1))), dec!(150));
    }
}
