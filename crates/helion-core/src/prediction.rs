//! Feature maps, predictor outputs, and the engine's trade signal.

use crate::{Price, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A mapping `feature_name -> value`, derived from recent bars. The key set
/// a given predictor requires is fixed by its loaded model manifest.
///
/// Probabilities and statistical inputs live in `f64`, not `Decimal` — they
/// never reach an order or an equity figure directly.
pub type Features = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prob_up: f64,
    pub confidence: f64,
    pub side: Side,
    pub size_fraction: f64,
}

impl Prediction {
    pub fn flat() -> Self {
        Self {
            prob_up: 0.5,
            confidence: 0.0,
            side: Side::Flat,
            size_fraction: 0.0,
        }
    }
}

/// The engine's decision to trade, handed to the `OrderExecutor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub side: crate::order::OrderSide,
    pub size_notional_usd: rust_decimal::Decimal,
    pub price_hint: Price,
    pub generated_at_ms: u64,
}
