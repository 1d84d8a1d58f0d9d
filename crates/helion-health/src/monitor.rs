//! Periodic liveness sampling over every registered engine.
//!
//! `HealthMonitor` owns no engines directly — it polls a `HealthSource` for
//! snapshots and calls back into a `RecoverySink` to request restarts. This
//! keeps the crate decoupled from whatever owns the engines themselves.

use crate::recovery::RecoveryPolicy;
use async_trait::async_trait;
use helion_core::{EngineHealth, Symbol};
use helion_telemetry::Metrics;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Supplies the current health snapshot for every registered engine.
#[async_trait]
pub trait HealthSource: Send + Sync {
    async fn snapshot(&self) -> Vec<EngineHealth>;
}

/// Accepts restart requests raised by the monitor.
#[async_trait]
pub trait RecoverySink: Send + Sync {
    async fn request_restart(&self, symbol: &Symbol, reason: &str);
}

#[derive(Clone)]
pub struct HealthMonitorConfig {
    pub check_interval_sec: u64,
    pub heartbeat_timeout_sec: u64,
    pub error_spike_threshold: u32,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_sec: 30,
            heartbeat_timeout_sec: 60,
            error_spike_threshold: 10,
        }
    }
}

pub struct HealthMonitor {
    config: HealthMonitorConfig,
    recovery: RecoveryPolicy,
    source: Arc<dyn HealthSource>,
    sink: Arc<dyn RecoverySink>,
    // error_count observed on the previous sample, per symbol, to detect a
    // spike that persists unchanged across two consecutive samples.
    last_error_count: dashmap::DashMap<Symbol, u32>,
}

impl HealthMonitor {
    pub fn new(
        config: HealthMonitorConfig,
        recovery: RecoveryPolicy,
        source: Arc<dyn HealthSource>,
        sink: Arc<dyn RecoverySink>,
    ) -> Self {
        Self {
            config,
            recovery,
            source,
            sink,
            last_error_count: dashmap::DashMap::new(),
        }
    }

    /// Runs the periodic check loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(Duration::from_secs(self.config.check_interval_sec));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("health monitor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.check_once().await;
                }
            }
        }
    }

    pub async fn check_once(&self) {
        let now_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs();

        for health in self.source.snapshot().await {
            self.evaluate(&health, now_unix).await;
        }
    }

    async fn evaluate(&self, health: &EngineHealth, now_unix: u64) {
        let symbol = &health.symbol;

        if health.state == helion_core::EngineState::Crashed {
            self.try_recover(symbol, "crashed").await;
            return;
        }

        if health.is_stale(now_unix, self.config.heartbeat_timeout_sec) {
            self.try_recover(symbol, "stale_heartbeat").await;
            return;
        }

        if health.error_count > self.config.error_spike_threshold {
            let repeated = self
                .last_error_count
                .get(symbol)
                .map(|v| *v == health.error_count)
                .unwrap_or(false);
            if repeated {
                self.try_recover(symbol, "error_spike").await;
                self.last_error_count.remove(symbol);
                return;
            }
        }
        self.last_error_count.insert(symbol.clone(), health.error_count);
    }

    async fn try_recover(&self, symbol: &Symbol, reason: &str) {
        if self.recovery.should_recover(symbol) {
            warn!(symbol = %symbol, reason, "requesting engine restart");
            Metrics::engine_restart(symbol.as_str());
            self.sink.request_restart(symbol, reason).await;
        } else {
            warn!(symbol = %symbol, reason, "restart suppressed: recovery policy denied");
        }
    }

    pub fn reset_recovery(&self, symbol: &Symbol) {
        self.recovery.reset(symbol);
    }
}
