//! Structured logging initialization.

use crate::error::TelemetryResult;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for the process-wide tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the process-wide `tracing` subscriber. Must be called exactly
/// once, before any engine is started.
pub fn init_logging(format: LogFormat) -> TelemetryResult<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .try_init()
                .map_err(|e| crate::error::TelemetryError::LoggingInit(e.to_string()))?;
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(true).with_thread_names(true))
                .try_init()
                .map_err(|e| crate::error::TelemetryError::LoggingInit(e.to_string()))?;
        }
    }

    Ok(())
}
