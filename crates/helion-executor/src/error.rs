//! Executor error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("broker submission failed: {0}")]
    Broker(#[from] helion_broker::BrokerError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
