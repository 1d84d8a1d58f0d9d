//! Manager-level configuration: the symbol list and the per-engine defaults
//! `StartAll` fans out to every `TradingEngine` it creates.

use helion_engine::EngineConfig;
use helion_executor::ExecutorConfig;
use helion_feed::FeederConfig;
use helion_health::{HealthMonitorConfig, RecoveryPolicyConfig};
use helion_predictor::PredictorConfig;
use helion_risk::RiskPolicy;
use helion_core::Symbol;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

pub struct ManagerConfig {
    pub symbols: Vec<Symbol>,
    pub queue_capacity: usize,
    pub engine: EngineConfig,
    pub executor: ExecutorConfig,
    pub feeder: FeederConfig,
    pub health: HealthMonitorConfig,
    pub recovery: RecoveryPolicyConfig,
    pub predictor: PredictorConfig,
    pub risk_policy: RiskPolicy,
    pub base_equity_usd: Decimal,
    pub registry_path: PathBuf,
    pub logs_dir: PathBuf,
    pub stop_timeout: Duration,
}

impl ManagerConfig {
    pub fn new(symbols: Vec<Symbol>, base_equity_usd: Decimal, registry_path: PathBuf) -> Self {
        let logs_dir = registry_path
            .parent()
            .map(|dir| dir.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self {
            symbols,
            queue_capacity: 128,
            engine: EngineConfig::default(),
            executor: ExecutorConfig::default(),
            feeder: FeederConfig::default(),
            health: HealthMonitorConfig::default(),
            recovery: RecoveryPolicyConfig::default(),
            predictor: PredictorConfig::default(),
            risk_policy: RiskPolicy::default(),
            base_equity_usd,
            registry_path,
            logs_dir,
            stop_timeout: Duration::from_secs(10),
        }
    }
}
