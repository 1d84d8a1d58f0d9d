//! Layered application configuration: compiled-in defaults, an optional
//! TOML file, then `HELION_*`-prefixed environment variables, merged via
//! the `config` crate's builder — the single source of truth for every
//! tunable named in the external configuration surface.

use crate::error::{AppError, AppResult};
use helion_core::Symbol;
use helion_engine::EngineConfig as EngineRuntimeConfig;
use helion_executor::ExecutorConfig as ExecutorRuntimeConfig;
use helion_feed::FeederConfig;
use helion_health::{HealthMonitorConfig, RecoveryPolicyConfig};
use helion_predictor::config::{PredictorConfig, PredictorWeights};
use helion_risk::RiskPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDefaultsSettings {
    #[serde(default = "default_cycle_interval_sec")]
    pub cycle_interval_sec: f64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_error_spike_threshold")]
    pub error_spike_threshold: u32,
    #[serde(default = "default_base_equity_usd")]
    pub base_equity_usd: Decimal,
}

fn default_cycle_interval_sec() -> f64 {
    1.0
}
fn default_queue_capacity() -> usize {
    128
}
fn default_error_spike_threshold() -> u32 {
    10
}
fn default_base_equity_usd() -> Decimal {
    Decimal::from(10_000)
}

impl Default for EngineDefaultsSettings {
    fn default() -> Self {
        Self {
            cycle_interval_sec: default_cycle_interval_sec(),
            queue_capacity: default_queue_capacity(),
            error_spike_threshold: default_error_spike_threshold(),
            base_equity_usd: default_base_equity_usd(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    #[serde(default = "default_health_check_interval_sec")]
    pub check_interval_sec: u64,
    #[serde(default = "default_heartbeat_timeout_sec")]
    pub heartbeat_timeout_sec: u64,
}

fn default_health_check_interval_sec() -> u64 {
    30
}
fn default_heartbeat_timeout_sec() -> u64 {
    60
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            check_interval_sec: default_health_check_interval_sec(),
            heartbeat_timeout_sec: default_heartbeat_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySettings {
    #[serde(default = "default_max_restarts_per_hour")]
    pub max_restarts_per_hour: u32,
    #[serde(default = "default_backoff_base_sec")]
    pub backoff_base_sec: u64,
}

fn default_max_restarts_per_hour() -> u32 {
    5
}
fn default_backoff_base_sec() -> u64 {
    60
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            max_restarts_per_hour: default_max_restarts_per_hour(),
            backoff_base_sec: default_backoff_base_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeederSettings {
    #[serde(default = "default_reconnect_base_sec")]
    pub reconnect_base_sec: u64,
    #[serde(default = "default_reconnect_cap_sec")]
    pub reconnect_cap_sec: u64,
    #[serde(default = "default_stable_window_sec")]
    pub stable_window_sec: u64,
}

fn default_reconnect_base_sec() -> u64 {
    1
}
fn default_reconnect_cap_sec() -> u64 {
    30
}
fn default_stable_window_sec() -> u64 {
    60
}

impl Default for FeederSettings {
    fn default() -> Self {
        Self {
            reconnect_base_sec: default_reconnect_base_sec(),
            reconnect_cap_sec: default_reconnect_cap_sec(),
            stable_window_sec: default_stable_window_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    #[serde(default = "default_rate_rps")]
    pub rate_rps: u32,
    #[serde(default = "default_exposure_limit_usd")]
    pub exposure_limit_usd: Decimal,
    #[serde(default = "default_broker_timeout_sec")]
    pub broker_timeout_sec: u64,
}

fn default_rate_rps() -> u32 {
    5
}
fn default_exposure_limit_usd() -> Decimal {
    Decimal::from(100_000)
}
fn default_broker_timeout_sec() -> u64 {
    10
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            rate_rps: default_rate_rps(),
            exposure_limit_usd: default_exposure_limit_usd(),
            broker_timeout_sec: default_broker_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorSettings {
    #[serde(default)]
    pub weights: PredictorWeights,
    #[serde(default = "default_threshold_entry")]
    pub threshold_entry: f64,
    #[serde(default)]
    pub required_features: Vec<String>,
}

fn default_threshold_entry() -> f64 {
    0.55
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            weights: PredictorWeights::default(),
            threshold_entry: default_threshold_entry(),
            required_features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSettings {
    #[serde(default = "default_model_tabular_path")]
    pub model_tabular: PathBuf,
    #[serde(default = "default_model_sequence_path")]
    pub model_sequence: PathBuf,
    #[serde(default = "default_registry_path")]
    pub registry: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

fn default_model_tabular_path() -> PathBuf {
    PathBuf::from("models/tabular.bin")
}
fn default_model_sequence_path() -> PathBuf {
    PathBuf::from("models/sequence.bin")
}
fn default_registry_path() -> PathBuf {
    PathBuf::from("data/registry.json")
}
fn default_logs_dir() -> PathBuf {
    PathBuf::from("data/logs")
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            model_tabular: default_model_tabular_path(),
            model_sequence: default_model_sequence_path(),
            registry: default_registry_path(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Log output format; JSON for production log shipping, text for a local
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormatSetting,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormatSetting::default(),
        }
    }
}

/// Single source of truth for every tunable the core and its ambient stack
/// recognize. Field names track the external configuration surface
/// verbatim so a deployed `config.toml` is self-documenting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbols_to_trade: Vec<Symbol>,
    #[serde(default)]
    pub engine_defaults: EngineDefaultsSettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub recovery: RecoverySettings,
    #[serde(default)]
    pub feeder: FeederSettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub risk_policy: RiskPolicy,
    #[serde(default)]
    pub predictor: PredictorSettings,
    #[serde(default)]
    pub paths: PathsSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols_to_trade: vec![Symbol::new("BTC/USDT")],
            engine_defaults: EngineDefaultsSettings::default(),
            health: HealthSettings::default(),
            recovery: RecoverySettings::default(),
            feeder: FeederSettings::default(),
            executor: ExecutorSettings::default(),
            risk_policy: RiskPolicy::default(),
            predictor: PredictorSettings::default(),
            paths: PathsSettings::default(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl EngineConfig {
    /// Merges compiled-in defaults, an optional TOML file at `path`, then
    /// `HELION_*`-prefixed environment variables, in that order of
    /// increasing precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            } else {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HELION")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Checks predictor weights sum to 1.0 within epsilon,
    /// `threshold_entry ∈ (0.5, 1.0]`, `queue_capacity > 0`,
    /// `max_restarts_per_hour > 0`, and the risk policy bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.predictor
            .weights
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !(0.5..=1.0).contains(&self.predictor.threshold_entry)
            || self.predictor.threshold_entry <= 0.5
        {
            return Err(ConfigError::Invalid(format!(
                "predictor.threshold_entry ({}) must be in (0.5, 1.0]",
                self.predictor.threshold_entry
            )));
        }

        if self.engine_defaults.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "engine_defaults.queue_capacity must be positive".to_string(),
            ));
        }

        if self.recovery.max_restarts_per_hour == 0 {
            return Err(ConfigError::Invalid(
                "recovery.max_restarts_per_hour must be positive".to_string(),
            ));
        }

        self.risk_policy
            .validate()
            .map_err(ConfigError::Invalid)?;

        if self.symbols_to_trade.is_empty() {
            return Err(ConfigError::Invalid(
                "symbols_to_trade must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn engine_runtime_config(&self) -> EngineRuntimeConfig {
        EngineRuntimeConfig {
            cycle_interval: Duration::from_secs_f64(self.engine_defaults.cycle_interval_sec),
            pop_timeout: Duration::from_secs(1),
            error_spike_threshold: self.engine_defaults.error_spike_threshold,
            window_capacity: helion_engine::features::DEFAULT_WINDOW_BARS,
        }
    }

    pub fn health_monitor_config(&self) -> HealthMonitorConfig {
        HealthMonitorConfig {
            check_interval_sec: self.health.check_interval_sec,
            heartbeat_timeout_sec: self.health.heartbeat_timeout_sec,
            error_spike_threshold: self.engine_defaults.error_spike_threshold,
        }
    }

    pub fn recovery_policy_config(&self) -> RecoveryPolicyConfig {
        RecoveryPolicyConfig {
            max_restarts_per_hour: self.recovery.max_restarts_per_hour,
            backoff_base_sec: self.recovery.backoff_base_sec,
        }
    }

    pub fn feeder_config(&self) -> FeederConfig {
        FeederConfig {
            reconnect_base_sec: self.feeder.reconnect_base_sec,
            reconnect_cap_sec: self.feeder.reconnect_cap_sec,
            stable_window_sec: self.feeder.stable_window_sec,
        }
    }

    pub fn executor_runtime_config(&self) -> ExecutorRuntimeConfig {
        ExecutorRuntimeConfig {
            rate_rps: self.executor.rate_rps,
            exposure_limit_usd: self.executor.exposure_limit_usd,
            coarse_window_ms: 1000,
        }
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            weights: self.predictor.weights,
            threshold_entry: self.predictor.threshold_entry,
            required_features: self.predictor.required_features.clone(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn mismatched_predictor_weights_fail_validation() {
        let mut config = EngineConfig::default();
        config.predictor.weights = PredictorWeights {
            tabular: 0.9,
            sequence: 0.9,
            auxiliary: 0.9,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_entry_at_boundary_is_rejected() {
        let mut config = EngineConfig::default();
        config.predictor.threshold_entry = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let mut config = EngineConfig::default();
        config.engine_defaults.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_with_no_file_falls_back_to_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.symbols_to_trade, vec![Symbol::new("BTC/USDT")]);
    }

    #[test]
    fn load_from_toml_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            symbols_to_trade = ["ETH/USDT"]

            [engine_defaults]
            queue_capacity = 256
            "#,
        )
        .unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.symbols_to_trade, vec![Symbol::new("ETH/USDT")]);
        assert_eq!(config.engine_defaults.queue_capacity, 256);
    }
}
