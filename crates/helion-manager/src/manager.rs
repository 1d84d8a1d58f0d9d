//! `EngineManager`: the lifecycle owner. Exclusively owns the
//! `MarketFeeder`, the shared `RiskManager`, the `HealthMonitor`, and every
//! `TradingEngine`.

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use helion_broker::Broker;
use helion_core::{EngineHealth, EngineState, Symbol};
use helion_executor::OrderExecutor;
use helion_feed::{Dispatcher, FeedResult, MarketFeeder, SymbolQueue};
use helion_health::{HealthMonitor, HealthSource, RecoveryPolicy, RecoverySink};
use helion_predictor::EnsemblePredictor;
use helion_registry::EngineRegistry;
use helion_risk::RiskManager;
use helion_telemetry::{EventLogger, Metrics};
use parking_lot::Mutex as SyncMutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct EngineSlot {
    handle: helion_engine::TradingEngineHandle,
    join: JoinHandle<()>,
}

/// The shared, cloneable state behind `EngineManager`. Split out so it can
/// implement `HealthSource`/`RecoverySink` without the manager itself having
/// to be wrapped in `Arc<dyn ..>` at the call site.
struct ManagerState<B: Broker + 'static> {
    risk: Arc<RiskManager>,
    predictor: Arc<EnsemblePredictor>,
    executor: Arc<OrderExecutor<B>>,
    feeder: Arc<MarketFeeder<B>>,
    dispatcher: Dispatcher,
    registry: Arc<EngineRegistry>,
    event_log: Arc<SyncMutex<EventLogger>>,
    engines: DashMap<Symbol, EngineSlot>,
    config: ManagerConfig,
}

impl<B: Broker + 'static> ManagerState<B> {
    async fn start_engine(&self, symbol: &Symbol) -> Result<()> {
        if self.engines.contains_key(symbol) {
            return Ok(());
        }

        let bars = match self.feeder.bootstrap(symbol).await {
            Ok(bars) => bars,
            Err(e) => {
                let mut health = EngineHealth::stopped(symbol.clone());
                health.state = EngineState::Crashed;
                health.last_error = Some(e.to_string());
                if let Err(reg_err) = self.registry.register(symbol.clone(), health).await {
                    warn!(symbol = %symbol, error = %reg_err, "failed to record bootstrap failure in registry");
                }
                return Err(ManagerError::Bootstrap {
                    symbol: symbol.to_string(),
                    source: e,
                });
            }
        };

        let queue = Arc::new(SymbolQueue::new(self.config.queue_capacity));
        self.dispatcher.register(symbol.clone(), queue.clone());

        let (handle, join) = helion_engine::spawn_trading_engine(
            symbol.clone(),
            queue,
            self.predictor.clone(),
            self.risk.clone(),
            self.executor.clone(),
            self.config.engine,
            bars,
            self.event_log.clone(),
        );

        self.registry
            .register(symbol.clone(), handle.health_snapshot())
            .await?;
        self.engines.insert(symbol.clone(), EngineSlot { handle, join });
        info!(symbol = %symbol, "engine started");
        Ok(())
    }

    async fn stop_engine(&self, symbol: &Symbol, timeout: Duration) -> Result<()> {
        let Some((_, slot)) = self.engines.remove(symbol) else {
            return Ok(());
        };
        self.dispatcher.unregister(symbol);
        slot.handle.stop();

        if tokio::time::timeout(timeout, slot.join).await.is_err() {
            warn!(symbol = %symbol, "engine did not stop within timeout, forcing STOPPED");
        }

        let mut health = slot.handle.health_snapshot();
        health.state = EngineState::Stopped;
        self.registry.update(symbol.clone(), health).await?;
        info!(symbol = %symbol, "engine stopped");
        Ok(())
    }

    async fn restart_engine(&self, symbol: &Symbol, timeout: Duration) -> Result<()> {
        self.stop_engine(symbol, timeout).await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.start_engine(symbol).await
    }
}

#[async_trait]
impl<B: Broker + 'static> HealthSource for ManagerState<B> {
    async fn snapshot(&self) -> Vec<EngineHealth> {
        self.engines
            .iter()
            .map(|e| {
                let slot = e.value();
                if slot.join.is_finished() && slot.handle.state() != EngineState::Stopped {
                    slot.handle.mark_crashed("engine task ended unexpectedly");
                }
                slot.handle.health_snapshot()
            })
            .collect()
    }
}

#[async_trait]
impl<B: Broker + 'static> RecoverySink for ManagerState<B> {
    async fn request_restart(&self, symbol: &Symbol, reason: &str) {
        warn!(symbol = %symbol, reason, "recovery-authorized restart");
        if let Err(e) = self.restart_engine(symbol, self.config.stop_timeout).await {
            warn!(symbol = %symbol, error = %e, "recovery restart failed");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagerStatus {
    pub total: usize,
    pub running: usize,
    pub crashed: usize,
    pub stopped: usize,
    pub per_engine_health: Vec<EngineHealth>,
}

pub struct EngineManager<B: Broker + 'static> {
    state: Arc<ManagerState<B>>,
    health_cancel: CancellationToken,
    health_join: SyncMutex<Option<JoinHandle<()>>>,
    feeder_join: Mutex<Option<JoinHandle<FeedResult<()>>>>,
}

impl<B: Broker + 'static> EngineManager<B> {
    pub fn new(
        broker: Arc<B>,
        predictor: Arc<EnsemblePredictor>,
        risk: Arc<RiskManager>,
        registry: Arc<EngineRegistry>,
        config: ManagerConfig,
    ) -> Self {
        let feeder = Arc::new(MarketFeeder::new(broker.clone(), config.feeder));
        let executor = Arc::new(OrderExecutor::new(broker, risk.clone(), config.executor.clone()));
        let event_log = Arc::new(SyncMutex::new(EventLogger::new(config.logs_dir.clone())));

        let state = Arc::new(ManagerState {
            risk,
            predictor,
            executor,
            feeder,
            dispatcher: Dispatcher::new(),
            registry,
            event_log,
            engines: DashMap::new(),
            config,
        });

        Self {
            state,
            health_cancel: CancellationToken::new(),
            health_join: SyncMutex::new(None),
            feeder_join: Mutex::new(None),
        }
    }

    /// Allocates a queue and engine per configured symbol, starts the
    /// feeder and the health monitor. Idempotent per symbol.
    pub async fn start_all(&self) -> Result<()> {
        let symbols = self.state.config.symbols.clone();
        for symbol in &symbols {
            self.state.start_engine(symbol).await?;
        }

        let feeder = self.state.feeder.clone();
        let dispatcher = self.state.dispatcher.clone();
        let feeder_join = tokio::spawn(async move { feeder.run(dispatcher).await });
        *self.feeder_join.lock().await = Some(feeder_join);

        let recovery = RecoveryPolicy::new(self.state.config.recovery.clone());
        let monitor = HealthMonitor::new(
            self.state.config.health.clone(),
            recovery,
            self.state.clone(),
            self.state.clone(),
        );
        let cancel = self.health_cancel.clone();
        let join = tokio::spawn(async move { monitor.run(cancel).await });
        *self.health_join.lock() = Some(join);

        info!("engine manager started");
        Ok(())
    }

    /// Stops the health monitor, the feeder, then every engine concurrently
    /// with `timeout` each. Safe to call even if `start_all` partially failed.
    pub async fn stop_all(&self, timeout: Duration) -> Result<()> {
        self.health_cancel.cancel();
        if let Some(join) = self.health_join.lock().take() {
            let _ = join.await;
        }

        self.state.feeder.close();
        if let Some(join) = self.feeder_join.lock().await.take() {
            let _ = tokio::time::timeout(timeout, join).await;
        }

        let symbols: Vec<Symbol> = self
            .state
            .engines
            .iter()
            .map(|e| e.key().clone())
            .collect();

        let stops = symbols
            .iter()
            .map(|s| self.state.stop_engine(s, timeout));
        for result in futures_util::future::join_all(stops).await {
            result?;
        }

        info!("engine manager stopped");
        Ok(())
    }

    pub async fn start_engine(&self, symbol: &Symbol) -> Result<()> {
        self.require_configured(symbol)?;
        self.state.start_engine(symbol).await
    }

    pub async fn stop_engine(&self, symbol: &Symbol, timeout: Duration) -> Result<()> {
        self.require_configured(symbol)?;
        self.state.stop_engine(symbol, timeout).await
    }

    /// `StopEngine` then `StartEngine` with a 1-second gap. Operator-
    /// initiated: does not consult `RecoveryPolicy`.
    pub async fn restart_engine(&self, symbol: &Symbol, timeout: Duration) -> Result<()> {
        self.require_configured(symbol)?;
        self.state.stop_engine(symbol, timeout).await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.state.start_engine(symbol).await
    }

    /// Operator calls target symbols by name; reject anything outside the
    /// configured universe rather than silently starting an ad-hoc engine.
    fn require_configured(&self, symbol: &Symbol) -> Result<()> {
        if self.state.config.symbols.contains(symbol) {
            Ok(())
        } else {
            Err(ManagerError::NotFound(symbol.to_string()))
        }
    }

    /// Synthesized from live engine health, not from the registry (the
    /// registry is a restart-survival fallback view only).
    pub fn status(&self) -> ManagerStatus {
        let per_engine_health: Vec<EngineHealth> = self
            .state
            .engines
            .iter()
            .map(|e| e.value().handle.health_snapshot())
            .collect();

        for health in &per_engine_health {
            Metrics::engine_state(health.symbol.as_str(), health.state);
        }

        let running = per_engine_health
            .iter()
            .filter(|h| h.state == EngineState::Running)
            .count();
        let crashed = per_engine_health
            .iter()
            .filter(|h| h.state == EngineState::Crashed)
            .count();
        let stopped = per_engine_health
            .iter()
            .filter(|h| matches!(h.state, EngineState::Stopped | EngineState::Stopping))
            .count();

        ManagerStatus {
            total: per_engine_health.len(),
            running,
            crashed,
            stopped,
            per_engine_health,
        }
    }

    pub fn risk_summary(&self) -> helion_core::EquityBook {
        self.state.risk.summary()
    }

    pub fn reset_day(&self) {
        self.state.risk.reset_day();
    }

    pub fn engage_kill_switch(&self, reason: impl Into<String>) {
        self.state.executor.engage_kill_switch(reason);
    }

    pub fn disengage_kill_switch(&self) {
        self.state.executor.disengage_kill_switch();
    }

    pub fn kill_switch_engaged(&self) -> bool {
        self.state.executor.kill_switch_engaged()
    }

    pub async fn get_status_one(&self, symbol: &Symbol) -> Option<EngineHealth> {
        self.state
            .engines
            .get(symbol)
            .map(|e| e.value().handle.health_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_broker::mock::MockBroker;
    use helion_core::Price;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    async fn manager() -> (EngineManager<MockBroker>, TempDir) {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(
            EngineRegistry::load(dir.path().join("registry.json"))
                .await
                .unwrap(),
        );
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let risk = Arc::new(RiskManager::new(helion_risk::RiskPolicy::default(), dec!(10000)));
        let predictor = Arc::new(EnsemblePredictor::degraded(
            helion_predictor::PredictorConfig::default(),
        ));

        let mut config = ManagerConfig::new(
            vec![Symbol::new("BTC/USDT")],
            dec!(10000),
            dir.path().join("registry.json"),
        );
        config.engine.pop_timeout = Duration::from_millis(20);
        config.engine.cycle_interval = Duration::from_millis(10);

        (
            EngineManager::new(broker, predictor, risk, registry, config),
            dir,
        )
    }

    #[tokio::test]
    async fn start_all_then_status_reports_one_running_engine() {
        let (manager, _dir) = manager().await;
        manager.start_all().await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let status = manager.status();
        assert_eq!(status.total, 1);
        assert_eq!(status.running, 1);

        manager.stop_all(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn starting_an_already_running_symbol_is_a_noop() {
        let (manager, _dir) = manager().await;
        manager.start_engine(&Symbol::new("BTC/USDT")).await.unwrap();
        manager.start_engine(&Symbol::new("BTC/USDT")).await.unwrap();

        assert_eq!(manager.status().total, 1);
        manager.stop_all(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn stop_all_is_safe_to_call_before_start() {
        let (manager, _dir) = manager().await;
        manager.stop_all(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn restart_engine_leaves_it_running_afterward() {
        let (manager, _dir) = manager().await;
        let symbol = Symbol::new("BTC/USDT");
        manager.start_engine(&symbol).await.unwrap();

        manager.restart_engine(&symbol, Duration::from_secs(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let health = manager.get_status_one(&symbol).await.unwrap();
        assert_eq!(health.state, EngineState::Running);

        manager.stop_all(Duration::from_secs(1)).await.unwrap();
    }
}
