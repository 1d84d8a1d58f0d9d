//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("logging initialization failed: {0}")]
    LoggingInit(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event record is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
