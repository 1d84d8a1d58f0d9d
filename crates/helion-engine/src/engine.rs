//! The per-symbol decision loop: pop a tick, build features, predict, size,
//! execute, repeat. Dual-state architecture matches the teacher's actor
//! pattern — the actor owns authoritative health and state, the handle
//! exposes a cheap synchronous view for `Manager.Status()` and the
//! `HealthMonitor`.

use crate::features::FeatureWindow;
use helion_broker::Broker;
use helion_core::{EngineHealth, EngineState, Side, Signal, Symbol};
use helion_executor::OrderExecutor;
use helion_feed::SymbolQueue;
use helion_predictor::EnsemblePredictor;
use helion_risk::RiskManager;
use helion_telemetry::{EventLogger, EventRecord};
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub cycle_interval: Duration,
    pub pop_timeout: Duration,
    pub error_spike_threshold: u32,
    pub window_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(1),
            pop_timeout: Duration::from_secs(1),
            error_spike_threshold: 10,
            window_capacity: crate::features::DEFAULT_WINDOW_BARS,
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// The authoritative, shared health/state cell. The actor is the only
/// writer; the handle and the `HealthMonitor` are readers.
struct SharedHealth {
    health: Mutex<EngineHealth>,
    state: Mutex<EngineState>,
}

pub struct TradingEngineHandle {
    pub symbol: Symbol,
    shared: Arc<SharedHealth>,
    cancel: CancellationToken,
}

impl TradingEngineHandle {
    pub fn health_snapshot(&self) -> EngineHealth {
        self.shared.health.lock().clone()
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.lock()
    }

    /// Requests STOPPING; the actor finishes its current cycle then exits.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Called by the manager when the task's `JoinHandle` reports it ended
    /// without the actor itself recording a `STOPPED` transition — a panic
    /// mid-cycle. A no-op if the engine already reached a terminal state
    /// through its own shutdown path.
    pub fn mark_crashed(&self, reason: &str) {
        let mut state = self.shared.state.lock();
        if *state == EngineState::Stopped || state.validate_transition(EngineState::Crashed).is_err() {
            return;
        }
        *state = EngineState::Crashed;
        let mut health = self.shared.health.lock();
        health.state = EngineState::Crashed;
        health.last_error = Some(reason.to_string());
    }
}

struct TradingEngineTask<B: Broker> {
    symbol: Symbol,
    queue: Arc<SymbolQueue>,
    predictor: Arc<EnsemblePredictor>,
    risk: Arc<RiskManager>,
    executor: Arc<OrderExecutor<B>>,
    config: EngineConfig,
    window: FeatureWindow,
    shared: Arc<SharedHealth>,
    cancel: CancellationToken,
    error_count: AtomicU32,
    event_log: Arc<Mutex<EventLogger>>,
    started_at_unix: u64,
}

impl<B: Broker> TradingEngineTask<B> {
    fn set_state(&self, next: EngineState) {
        let mut state = self.shared.state.lock();
        match state.validate_transition(next) {
            Ok(()) => *state = next,
            Err(e) => error!(symbol = %self.symbol, error = %e, "illegal engine state transition attempted"),
        }
        self.shared.health.lock().state = next;
    }

    fn log_event(&self, event_type: &str, payload: serde_json::Value) {
        let record = EventRecord {
            ts: now_unix() as i64,
            level: "info".to_string(),
            symbol: self.symbol.to_string(),
            event_type: event_type.to_string(),
            payload,
        };
        if let Err(e) = self.event_log.lock().log(record) {
            warn!(symbol = %self.symbol, error = %e, "failed to write event log record");
        }
    }

    async fn run(mut self, bootstrap_bars: Vec<helion_core::Bar>) {
        self.set_state(EngineState::Starting);
        self.started_at_unix = now_unix();
        self.window.seed(bootstrap_bars);
        self.set_state(EngineState::Running);
        self.log_event("start", serde_json::json!({}));
        info!(symbol = %self.symbol, "trading engine running");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.run_cycle().await {
                self.log_event("crashed", serde_json::json!({}));
                error!(symbol = %self.symbol, "trading engine crashed, awaiting supervisor restart");
                return;
            }
        }

        self.set_state(EngineState::Stopping);
        self.set_state(EngineState::Stopped);
        self.log_event("stop", serde_json::json!({}));
        info!(symbol = %self.symbol, "trading engine stopped");
    }

    /// Runs one signal -> risk -> execution cycle. Returns `true` if the
    /// engine transitioned to `CRASHED` and the run loop must stop.
    async fn run_cycle(&mut self) -> bool {
        {
            let equity = self.risk.summary();
            let mut health = self.shared.health.lock();
            let now = now_unix();
            health.last_heartbeat_unix = now;
            health.uptime_seconds = now.saturating_sub(self.started_at_unix);
            health.position_count = equity.positions_open;
            health.daily_pnl_pct = equity.realized_today_pct.to_f64().unwrap_or(0.0);
        }

        let md = match self.queue.pop(self.config.pop_timeout).await {
            Some(md) => md,
            None => {
                self.sleep_cycle().await;
                return false;
            }
        };

        self.window.push_tick(&md);

        let features = match self.window.build_features() {
            Some(f) => f,
            None => {
                self.sleep_cycle().await;
                return false;
            }
        };

        let prediction = match self.predictor.predict(&features, md.sentiment_placeholder()) {
            Ok(p) => p,
            Err(e) => {
                return self.on_cycle_error(&e.to_string()).await;
            }
        };

        if self.predictor.is_degraded() || prediction.side == Side::Flat {
            self.sleep_cycle().await;
            return false;
        }

        let annual_vol = self.window.annual_volatility();
        let equity_now = self.risk.summary().equity_now;
        let size_usd = self.risk.position_size_usd(
            &self.symbol,
            prediction.prob_up,
            prediction.confidence,
            annual_vol,
            equity_now,
        );

        let order_side = match prediction.side {
            Side::Long => helion_core::OrderSide::Buy,
            Side::Short => helion_core::OrderSide::Sell,
            Side::Flat => unreachable!("flat side filtered out above"),
        };

        let signal = Signal {
            symbol: self.symbol.clone(),
            side: order_side,
            size_notional_usd: size_usd,
            price_hint: md.price,
            generated_at_ms: md.timestamp_ms,
        };

        let result = self.executor.execute(signal).await;
        self.log_event(
            "order_submit",
            serde_json::json!({
                "ok": result.ok,
                "reason": result.reason,
                "order_id": result.order_id,
            }),
        );
        if result.ok {
            info!(symbol = %self.symbol, order_id = ?result.order_id, "signal executed");
            self.log_event("fill", serde_json::json!({ "order_id": result.order_id }));
        } else {
            warn!(symbol = %self.symbol, reason = ?result.reason, "signal blocked");
        }

        self.sleep_cycle().await;
        false
    }

    /// Handles a cycle error. Returns `true` if the error count crossed the
    /// spike threshold and the engine transitioned to `CRASHED`, in which
    /// case the run loop must stop without the usual backoff sleep.
    async fn on_cycle_error(&mut self, message: &str) -> bool {
        let count = self.error_count.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut health = self.shared.health.lock();
            health.error_count = count;
            health.last_error = Some(message.to_string());
        }
        warn!(symbol = %self.symbol, error = message, error_count = count, "cycle error");
        self.log_event(
            "cycle_error",
            serde_json::json!({ "error": message, "error_count": count }),
        );

        if count > self.config.error_spike_threshold {
            warn!(symbol = %self.symbol, error_count = count, "error spike threshold exceeded, transitioning to crashed");
            self.set_state(EngineState::Crashed);
            return true;
        }

        let backoff_sec = (1u64 << count.min(6)).min(60);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(backoff_sec)) => {}
            _ = self.cancel.cancelled() => {}
        }
        false
    }

    async fn sleep_cycle(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.cycle_interval) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

/// Spawns the per-symbol decision loop. `bootstrap_bars` must already be
/// gap-filled (the caller runs `MarketFeeder::bootstrap` first).
pub fn spawn_trading_engine<B: Broker + 'static>(
    symbol: Symbol,
    queue: Arc<SymbolQueue>,
    predictor: Arc<EnsemblePredictor>,
    risk: Arc<RiskManager>,
    executor: Arc<OrderExecutor<B>>,
    config: EngineConfig,
    bootstrap_bars: Vec<helion_core::Bar>,
    event_log: Arc<Mutex<EventLogger>>,
) -> (TradingEngineHandle, JoinHandle<()>) {
    let shared = Arc::new(SharedHealth {
        health: Mutex::new(EngineHealth::stopped(symbol.clone())),
        state: Mutex::new(EngineState::Stopped),
    });
    let cancel = CancellationToken::new();

    let task = TradingEngineTask {
        symbol: symbol.clone(),
        queue,
        predictor,
        risk,
        executor,
        config,
        window: FeatureWindow::new(config.window_capacity),
        shared: shared.clone(),
        cancel: cancel.clone(),
        error_count: AtomicU32::new(0),
        event_log,
        started_at_unix: 0,
    };

    let handle = TradingEngineHandle {
        symbol,
        shared,
        cancel,
    };

    let join = tokio::spawn(task.run(bootstrap_bars));
    (handle, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_broker::mock::MockBroker;
    use helion_core::Price;
    use helion_predictor::{PredictorConfig, PredictorWeights};
    use helion_risk::RiskPolicy;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sym() -> Symbol {
        Symbol::new("BTC/USDT")
    }

    fn event_log() -> (Arc<Mutex<EventLogger>>, TempDir) {
        let dir = TempDir::new().unwrap();
        (Arc::new(Mutex::new(EventLogger::new(dir.path()))), dir)
    }

    #[tokio::test]
    async fn engine_transitions_to_running_then_stopped_on_cancel() {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let queue = Arc::new(SymbolQueue::new(8));
        let predictor = Arc::new(EnsemblePredictor::degraded(PredictorConfig {
            weights: PredictorWeights::default(),
            threshold_entry: 0.55,
            required_features: vec![],
        }));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        let executor = Arc::new(OrderExecutor::new(
            broker,
            risk.clone(),
            helion_executor::ExecutorConfig::default(),
        ));

        let config = EngineConfig {
            pop_timeout: Duration::from_millis(20),
            cycle_interval: Duration::from_millis(10),
            ..EngineConfig::default()
        };

        let (events, _dir) = event_log();
        let (handle, join) =
            spawn_trading_engine(sym(), queue, predictor, risk, executor, config, vec![], events);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handle.state(), EngineState::Running);

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), join).await.unwrap().unwrap();

        assert_eq!(handle.state(), EngineState::Stopped);
    }

    #[tokio::test]
    async fn heartbeat_advances_each_cycle() {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let queue = Arc::new(SymbolQueue::new(8));
        let predictor = Arc::new(EnsemblePredictor::degraded(PredictorConfig::default()));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        let executor = Arc::new(OrderExecutor::new(
            broker,
            risk.clone(),
            helion_executor::ExecutorConfig::default(),
        ));
        let config = EngineConfig {
            pop_timeout: Duration::from_millis(10),
            cycle_interval: Duration::from_millis(10),
            ..EngineConfig::default()
        };

        let (events, _dir) = event_log();
        let (handle, join) =
            spawn_trading_engine(sym(), queue, predictor, risk, executor, config, vec![], events);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let health = handle.health_snapshot();
        assert!(health.last_heartbeat_unix > 0);

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), join).await.unwrap().unwrap();
    }

    fn task(config: EngineConfig) -> (TradingEngineTask<MockBroker>, Arc<SharedHealth>, TempDir) {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let queue = Arc::new(SymbolQueue::new(8));
        let predictor = Arc::new(EnsemblePredictor::degraded(PredictorConfig::default()));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        let executor = Arc::new(OrderExecutor::new(
            broker,
            risk.clone(),
            helion_executor::ExecutorConfig::default(),
        ));
        let shared = Arc::new(SharedHealth {
            health: Mutex::new(EngineHealth::stopped(sym())),
            state: Mutex::new(EngineState::Running),
        });
        let (events, dir) = event_log();
        let t = TradingEngineTask {
            symbol: sym(),
            queue,
            predictor,
            risk,
            executor,
            config,
            window: FeatureWindow::new(config.window_capacity),
            shared: shared.clone(),
            cancel: CancellationToken::new(),
            error_count: AtomicU32::new(0),
            event_log: events,
            started_at_unix: 0,
        };
        (t, shared, dir)
    }

    #[tokio::test]
    async fn repeated_cycle_errors_past_threshold_transition_to_crashed() {
        let config = EngineConfig {
            error_spike_threshold: 2,
            ..EngineConfig::default()
        };
        let (mut t, shared, _dir) = task(config);

        assert!(!t.on_cycle_error("boom").await);
        assert!(!t.on_cycle_error("boom").await);
        assert!(t.on_cycle_error("boom").await);

        assert_eq!(*shared.state.lock(), EngineState::Crashed);
        assert_eq!(shared.health.lock().state, EngineState::Crashed);
    }

    #[tokio::test]
    async fn cycle_heartbeat_reports_uptime_and_position_count() {
        let config = EngineConfig {
            pop_timeout: Duration::from_millis(5),
            cycle_interval: Duration::from_millis(5),
            ..EngineConfig::default()
        };
        let (mut t, shared, _dir) = task(config);
        t.started_at_unix = now_unix().saturating_sub(5);
        t.risk.on_order_filled(&sym(), true, dec!(100), Decimal::ZERO);

        t.run_cycle().await;

        let health = shared.health.lock().clone();
        assert_eq!(health.position_count, 1);
        assert!(health.uptime_seconds >= 5);
    }
}
