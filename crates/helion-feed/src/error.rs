//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("bootstrap failed after {attempts} attempts for {symbol}: {source}")]
    Bootstrap {
        symbol: String,
        attempts: u32,
        source: helion_broker::BrokerError,
    },

    #[error("broker error: {0}")]
    Broker(#[from] helion_broker::BrokerError),

    #[error("stream ended unrecoverably after backoff exhaustion")]
    ConnectionExhausted,
}

pub type FeedResult<T> = Result<T, FeedError>;
