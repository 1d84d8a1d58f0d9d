//! Liveness sampling and bounded restart authorization for running engines.

pub mod error;
pub mod monitor;
pub mod recovery;

pub use error::{HealthError, Result};
pub use monitor::{HealthMonitor, HealthMonitorConfig, HealthSource, RecoverySink};
pub use recovery::{RecoveryPolicy, RecoveryPolicyConfig};
