//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bootstrap failed for {symbol}: {source}")]
    Bootstrap {
        symbol: String,
        #[source]
        source: helion_feed::FeedError,
    },

    #[error("illegal state transition: {0}")]
    Transition(#[from] helion_core::CoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
