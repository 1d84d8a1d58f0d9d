//! Wires a concrete `Broker` to an `EngineManager` and runs it to
//! completion. This is the one place in the repository that knows how to
//! assemble the whole stack; everything else is a reusable library crate.

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use helion_broker::Broker;
use helion_manager::{EngineManager, ManagerConfig, ManagerStatus};
use helion_predictor::{EnsemblePredictor, ModelPaths};
use helion_registry::EngineRegistry;
use helion_risk::RiskManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct Application<B: Broker + 'static> {
    manager: EngineManager<B>,
}

impl<B: Broker + 'static> Application<B> {
    /// Loads the on-disk registry and assembles the manager. Does not start
    /// anything yet; call `start` or `run` for that.
    pub async fn new(broker: Arc<B>, config: &EngineConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::from)?;

        let model_paths = ModelPaths {
            tabular: config.paths.model_tabular.clone(),
            sequence: config.paths.model_sequence.clone(),
        };
        let predictor = match EnsemblePredictor::load(config.predictor_config(), &model_paths) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                warn!(error = %e, "model artifacts unavailable, starting degraded (FLAT-only) predictor");
                Arc::new(EnsemblePredictor::degraded(config.predictor_config()))
            }
        };

        let risk = Arc::new(RiskManager::new(
            config.risk_policy.clone(),
            config.engine_defaults.base_equity_usd,
        ));

        let registry = Arc::new(EngineRegistry::load(config.paths.registry.clone()).await?);

        let manager_config = ManagerConfig {
            symbols: config.symbols_to_trade.clone(),
            queue_capacity: config.engine_defaults.queue_capacity,
            engine: config.engine_runtime_config(),
            executor: config.executor_runtime_config(),
            feeder: config.feeder_config(),
            health: config.health_monitor_config(),
            recovery: config.recovery_policy_config(),
            predictor: config.predictor_config(),
            risk_policy: config.risk_policy.clone(),
            base_equity_usd: config.engine_defaults.base_equity_usd,
            registry_path: config.paths.registry.clone(),
            logs_dir: config.paths.logs_dir.clone(),
            stop_timeout: Duration::from_secs(10),
        };

        let manager = EngineManager::new(broker, predictor, risk, registry, manager_config);

        Ok(Self { manager })
    }

    /// Starts every configured engine, the feeder, and the health monitor.
    pub async fn start(&self) -> AppResult<()> {
        self.manager.start_all().await?;
        info!("application started");
        Ok(())
    }

    /// Runs until ctrl-c is observed, then stops cleanly.
    pub async fn run(&self) -> AppResult<()> {
        self.start().await?;

        tokio::signal::ctrl_c().await.map_err(AppError::Io)?;
        info!("shutdown signal received");

        self.stop().await
    }

    pub async fn stop(&self) -> AppResult<()> {
        self.manager
            .stop_all(Duration::from_secs_f64(10.0))
            .await?;
        info!("application stopped");
        Ok(())
    }

    pub fn status(&self) -> ManagerStatus {
        self.manager.status()
    }

    pub fn manager(&self) -> &EngineManager<B> {
        &self.manager
    }
}
