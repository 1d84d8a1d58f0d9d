//! The single subscriber to the exchange's live tick stream.
//!
//! `Run` owns the reconnect loop; `Bootstrap` fetches and gap-fills history
//! at engine startup. Reconnection idiom (exponential backoff with a jitter
//! term) follows the same shape as a websocket connection manager; the
//! stable-window reset is new — the feeder forgives past reconnects once a
//! connection has stayed up long enough to prove itself.

use crate::dispatcher::Dispatcher;
use crate::error::{FeedError, FeedResult};
use crate::gap_fill::gap_fill;
use helion_broker::Broker;
use helion_core::{Bar, Symbol, BAR_INTERVAL_MS};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_BOOTSTRAP_BARS: usize = 1500;
const BOOTSTRAP_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct FeederConfig {
    pub reconnect_base_sec: u64,
    pub reconnect_cap_sec: u64,
    pub stable_window_sec: u64,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            reconnect_base_sec: 1,
            reconnect_cap_sec: 30,
            stable_window_sec: 60,
        }
    }
}

impl FeederConfig {
    /// `min(base * 2^attempt, cap)` seconds, zero-indexed by attempt count.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(10);
        let scaled = self.reconnect_base_sec.saturating_mul(1u64 << exponent);
        Duration::from_secs(scaled.min(self.reconnect_cap_sec))
    }
}

pub struct MarketFeeder<B: Broker> {
    broker: Arc<B>,
    config: FeederConfig,
    cancel: CancellationToken,
    reconnect_attempts: AtomicU32,
}

impl<B: Broker> MarketFeeder<B> {
    pub fn new(broker: Arc<B>, config: FeederConfig) -> Self {
        Self {
            broker,
            config,
            cancel: CancellationToken::new(),
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    /// Fetches the most recent `limit` minute-bars, gap-fills them, and
    /// returns them for the engine's rolling window at startup. Three
    /// failed fetches fail with `FeedError::Bootstrap`.
    pub async fn bootstrap(&self, symbol: &Symbol) -> FeedResult<Vec<Bar>> {
        self.bootstrap_with_limit(symbol, DEFAULT_BOOTSTRAP_BARS).await
    }

    pub async fn bootstrap_with_limit(&self, symbol: &Symbol, limit: usize) -> FeedResult<Vec<Bar>> {
        let mut last_err = None;
        for attempt in 1..=BOOTSTRAP_ATTEMPTS {
            match self
                .broker
                .fetch_historical_bars(symbol, BAR_INTERVAL_MS, limit)
                .await
            {
                Ok(bars) => return Ok(gap_fill(&bars)),
                Err(e) => {
                    warn!(symbol = %symbol, attempt, error = %e, "bootstrap history fetch failed");
                    last_err = Some(e);
                }
            }
        }
        Err(FeedError::Bootstrap {
            symbol: symbol.to_string(),
            attempts: BOOTSTRAP_ATTEMPTS,
            source: last_err.expect("loop ran at least once"),
        })
    }

    /// Opens the live stream and dispatches every tick through `dispatcher`
    /// from this task's own execution context, synchronously per tick.
    /// Long-lived: returns only on explicit cancellation (`close`) or when
    /// reconnection backoff is exhausted by the caller never calling close
    /// (in practice it runs forever, matching the "no replay" contract —
    /// ticks in flight during a reconnect are simply lost).
    pub async fn run(&self, dispatcher: Dispatcher) -> FeedResult<()> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let mut rx = match self.broker.stream_ticks().await {
                Ok(rx) => rx,
                Err(e) => {
                    self.wait_before_reconnect().await;
                    warn!(error = %e, "stream open failed, retrying");
                    continue;
                }
            };

            info!("market feeder connected");
            let stream_started = tokio::time::Instant::now();

            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Ok(()),
                    tick = rx.recv() => {
                        match tick {
                            Some(md) => dispatcher.dispatch(md),
                            None => {
                                warn!("tick stream closed, reconnecting");
                                break;
                            }
                        }
                    }
                }
            }

            if stream_started.elapsed() >= Duration::from_secs(self.config.stable_window_sec) {
                self.reconnect_attempts.store(0, Ordering::Relaxed);
            }
            self.wait_before_reconnect().await;
        }
    }

    async fn wait_before_reconnect(&self) {
        let attempt = self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        let delay = self.config.backoff_delay(attempt);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Requests termination of `run`; idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_doubles_up_to_cap() {
        let cfg = FeederConfig::default();
        assert_eq!(cfg.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(cfg.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(cfg.backoff_delay(5), Duration::from_secs(30));
        assert_eq!(cfg.backoff_delay(20), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn bootstrap_gap_fills_the_broker_result() {
        use helion_broker::mock::MockBroker;
        use helion_core::Price;
        use rust_decimal_macros::dec;

        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let feeder = MarketFeeder::new(broker, FeederConfig::default());
        let bars = feeder
            .bootstrap_with_limit(&Symbol::new("BTC/USDT"), 10)
            .await
            .unwrap();
        assert_eq!(bars.len(), 10);
        for pair in bars.windows(2) {
            assert_eq!(pair[1].timestamp_ms - pair[0].timestamp_ms, BAR_INTERVAL_MS);
        }
    }

    #[tokio::test]
    async fn close_before_run_returns_immediately() {
        use helion_broker::mock::MockBroker;
        use helion_core::Price;
        use rust_decimal_macros::dec;

        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let feeder = Arc::new(MarketFeeder::new(broker, FeederConfig::default()));
        feeder.close();
        let dispatcher = Dispatcher::new();
        let result = tokio::time::timeout(Duration::from_millis(200), feeder.run(dispatcher)).await;
        assert!(result.is_ok(), "run should return promptly once cancelled");
    }
}
