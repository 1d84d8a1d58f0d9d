//! Process-wide observability: logging initialization, a Prometheus
//! metrics registry, and the per-symbol append-only event log.

pub mod error;
pub mod event_log;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use event_log::{EventLogger, EventRecord};
pub use logging::{init_logging, LogFormat};
pub use metrics::Metrics;
