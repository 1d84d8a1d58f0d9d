//! The engine's rolling window of recent bars and the feature map derived
//! from it each cycle.
//!
//! The contract fixes only the key set a given predictor expects; this
//! window produces a fixed, documented set of technical features computed
//! purely from the rolling window plus the latest tick, independent of
//! whatever model is loaded behind the predictor.

use helion_core::{Bar, Features, MarketData};
use rust_decimal::prelude::ToPrimitive;
use std::collections::VecDeque;

pub const DEFAULT_WINDOW_BARS: usize = 200;

/// Feature keys this window is capable of producing. A predictor config
/// whose `required_features` is a subset of these will never see a
/// `FeatureError`.
pub const FEATURE_KEYS: &[&str] = &["last_return", "sma_ratio", "rsi", "realized_vol"];

pub struct FeatureWindow {
    capacity: usize,
    bars: VecDeque<Bar>,
}

impl FeatureWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            bars: VecDeque::with_capacity(capacity),
        }
    }

    /// Seeds the window from `Bootstrap`'s gap-filled result, keeping only
    /// the most recent `capacity` bars.
    pub fn seed(&mut self, bars: Vec<Bar>) {
        self.bars.clear();
        for bar in bars.into_iter().rev().take(self.capacity).collect::<Vec<_>>().into_iter().rev() {
            self.bars.push_back(bar);
        }
    }

    /// Folds a live tick into the window as a synthetic one-bar update so
    /// the predictor always sees the freshest price, without waiting for
    /// the next minute boundary.
    pub fn push_tick(&mut self, md: &MarketData) {
        let bar = Bar {
            timestamp_ms: md.timestamp_ms,
            open: md.price,
            high: md.price,
            low: md.price,
            close: md.price,
            volume: md.volume,
        };
        if self.bars.len() >= self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Builds the feature map from the current window. Returns `None` if
    /// there isn't enough history yet (fewer than 2 bars) — the caller
    /// treats this the same as a `FeatureError` from the predictor.
    pub fn build_features(&self) -> Option<Features> {
        if self.bars.len() < 2 {
            return None;
        }

        let closes: Vec<f64> = self
            .bars
            .iter()
            .map(|b| b.close.inner().to_f64().unwrap_or(0.0))
            .collect();

        let last = *closes.last().unwrap();
        let prev = closes[closes.len() - 2];
        let last_return = if prev != 0.0 { (last - prev) / prev } else { 0.0 };

        let sma_window = closes.len().min(20);
        let sma: f64 = closes[closes.len() - sma_window..].iter().sum::<f64>() / sma_window as f64;
        let sma_ratio = if sma != 0.0 { last / sma } else { 1.0 };

        let rsi = relative_strength_index(&closes, 14);
        let realized_vol = realized_volatility(&closes);

        let mut features = Features::new();
        features.insert("last_return".to_string(), last_return);
        features.insert("sma_ratio".to_string(), sma_ratio);
        features.insert("rsi".to_string(), rsi);
        features.insert("realized_vol".to_string(), realized_vol);
        Some(features)
    }

    /// Annualized volatility estimate handed to `RiskManager::position_size_usd`.
    /// Assumes 525,600 one-minute bars per year.
    pub fn annual_volatility(&self) -> f64 {
        let closes: Vec<f64> = self
            .bars
            .iter()
            .map(|b| b.close.inner().to_f64().unwrap_or(0.0))
            .collect();
        realized_volatility(&closes) * (525_600f64).sqrt()
    }
}

fn realized_volatility(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

/// Standard Wilder RSI over the trailing `period` returns, falling back to
/// a neutral 50.0 when there isn't enough history.
fn relative_strength_index(closes: &[f64], period: usize) -> f64 {
    if closes.len() <= period {
        return 50.0;
    }
    let window = &closes[closes.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    if losses == 0.0 {
        return 100.0;
    }
    let rs = (gains / period as f64) / (losses / period as f64);
    100.0 - (100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_core::{AuxiliaryFields, Price, Size, Symbol};
    use rust_decimal_macros::dec;

    fn bar(ts: u64, close: rust_decimal::Decimal) -> Bar {
        Bar {
            timestamp_ms: ts,
            open: Price::new(close),
            high: Price::new(close),
            low: Price::new(close),
            close: Price::new(close),
            volume: Size::ZERO,
        }
    }

    fn tick(ts: u64, price: rust_decimal::Decimal) -> MarketData {
        MarketData {
            symbol: Symbol::new("BTC/USDT"),
            price: Price::new(price),
            spread: Price::new(dec!(0.1)),
            volume: Size::new(dec!(1)),
            timestamp_ms: ts,
            auxiliary: AuxiliaryFields::default(),
        }
    }

    #[test]
    fn empty_window_has_no_features() {
        let window = FeatureWindow::new(DEFAULT_WINDOW_BARS);
        assert!(window.build_features().is_none());
    }

    #[test]
    fn window_caps_at_capacity_after_seed_and_ticks() {
        let mut window = FeatureWindow::new(4);
        let bars: Vec<Bar> = (0..10).map(|i| bar(i * 60_000, dec!(100))).collect();
        window.seed(bars);
        assert_eq!(window.len(), 4);

        window.push_tick(&tick(1_000_000, dec!(101)));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn features_reflect_a_price_increase() {
        let mut window = FeatureWindow::new(DEFAULT_WINDOW_BARS);
        window.seed(vec![bar(0, dec!(100)), bar(60_000, dec!(100))]);
        window.push_tick(&tick(120_000, dec!(110)));

        let features = window.build_features().unwrap();
        assert!(features["last_return"] > 0.0);
    }
}
