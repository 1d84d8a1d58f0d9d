//! Prometheus metrics for the trading engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (duplicate metric names) that
//! should crash at startup rather than fail silently. These panics only
//! occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder,
};

/// Ticks a `MarketFeeder` dispatched to a `SymbolQueue`.
pub static TICKS_RECEIVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helion_ticks_received_total",
        "Total ticks received by a symbol's queue",
        &["symbol"]
    )
    .unwrap()
});

/// Ticks dropped by a `SymbolQueue`'s drop-oldest backpressure policy.
pub static TICKS_DROPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helion_ticks_dropped_total",
        "Total ticks dropped under queue backpressure",
        &["symbol"]
    )
    .unwrap()
});

/// Orders submitted via `OrderExecutor::execute`, labeled by outcome.
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helion_orders_submitted_total",
        "Total orders submitted, labeled by result",
        &["symbol", "result"]
    )
    .unwrap()
});

/// Risk gate blocks, labeled by reason.
pub static RISK_BLOCKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helion_risk_blocks_total",
        "Total signals blocked by the risk gate",
        &["symbol", "reason"]
    )
    .unwrap()
});

/// Engine restarts authorized by the `RecoveryPolicy`.
pub static ENGINE_RESTARTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "helion_engine_restarts_total",
        "Total engine restarts authorized by the recovery policy",
        &["symbol"]
    )
    .unwrap()
});

/// Current `EngineState` per symbol, encoded as an integer
/// (0=Stopped, 1=Starting, 2=Running, 3=Stopping, 4=Crashed).
pub static ENGINE_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "helion_engine_state",
        "Current engine state, encoded as an integer",
        &["symbol"]
    )
    .unwrap()
});

/// Facade over the process-wide metric registry.
pub struct Metrics;

impl Metrics {
    pub fn tick_received(symbol: &str) {
        TICKS_RECEIVED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn tick_dropped(symbol: &str) {
        TICKS_DROPPED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn order_submitted(symbol: &str, result: &str) {
        ORDERS_SUBMITTED_TOTAL
            .with_label_values(&[symbol, result])
            .inc();
    }

    pub fn risk_block(symbol: &str, reason: &str) {
        RISK_BLOCKS_TOTAL.with_label_values(&[symbol, reason]).inc();
    }

    pub fn engine_restart(symbol: &str) {
        ENGINE_RESTARTS_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn engine_state(symbol: &str, state: helion_core::EngineState) {
        ENGINE_STATE
            .with_label_values(&[symbol])
            .set(state as i32 as f64);
    }

    /// Renders the current registry in the Prometheus text exposition
    /// format, for a thin external HTTP handler to serve.
    pub fn render() -> Result<String, prometheus::Error> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        Metrics::tick_received("BTC/USDT");
        let text = Metrics::render().unwrap();
        assert!(text.contains("helion_ticks_received_total"));
    }

    #[test]
    fn engine_state_gauge_reflects_enum_value() {
        Metrics::engine_state("ETH/USDT", helion_core::EngineState::Running);
        let text = Metrics::render().unwrap();
        assert!(text.contains("helion_engine_state"));
    }
}
