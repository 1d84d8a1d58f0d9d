//! Market data and the minute-bar sequence the predictor trains its features on.

use crate::{Price, Size, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange-supplied context riding along with a tick: funding, open
/// interest, and an optional precomputed sentiment score.
///
/// Sentiment is expected to already be a number in `[-1, 1]` by the time it
/// reaches `MarketData` — the feeder or an upstream ingest adapter is
/// responsible for computing it; nothing in this crate fetches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryFields {
    pub funding_rate: Option<Decimal>,
    pub open_interest: Option<Decimal>,
    pub sentiment: Option<f64>,
}

/// A single normalized tick. Immutable once published by the feeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: Symbol,
    pub price: Price,
    pub spread: Price,
    pub volume: Size,
    pub timestamp_ms: u64,
    pub auxiliary: AuxiliaryFields,
}

impl MarketData {
    /// Sentiment placeholder consumed by the predictor as `auxiliary_score`.
    /// Absent sentiment reads as neutral (0.0), matching a FLAT-biasing
    /// contribution rather than an error.
    pub fn sentiment_placeholder(&self) -> f64 {
        self.auxiliary.sentiment.unwrap_or(0.0)
    }
}

/// A minute-aligned OHLCV aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp_ms: u64,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Size,
}

/// Minute bars are 60,000ms apart by contract.
pub const BAR_INTERVAL_MS: u64 = 60_000;

impl Bar {
    pub fn synthetic_from_close(timestamp_ms: u64, last_close: Price) -> Self {
        Self {
            timestamp_ms,
            open: last_close,
            high: last_close,
            low: last_close,
            close: last_close,
            volume: Size::ZERO,
        }
    }
}
