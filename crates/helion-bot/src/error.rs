//! Application error types. Library crates underneath stay on `thiserror`;
//! this is the one place `anyhow` composes over them, at the CLI boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("feed error: {0}")]
    Feed(#[from] helion_feed::FeedError),

    #[error("registry error: {0}")]
    Registry(#[from] helion_registry::RegistryError),

    #[error("predictor error: {0}")]
    Predictor(#[from] helion_predictor::PredictorError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] helion_telemetry::TelemetryError),

    #[error("manager error: {0}")]
    Manager(#[from] helion_manager::ManagerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shutdown requested")]
    Shutdown,
}

pub type AppResult<T> = Result<T, AppError>;
