//! Error types for helion-broker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("historical bar fetch failed: {0}")]
    HistoryFetch(String),

    #[error("tick stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("order submission rejected: {0}")]
    SubmitRejected(String),

    #[error("balances/positions sync failed: {0}")]
    SyncFailed(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
