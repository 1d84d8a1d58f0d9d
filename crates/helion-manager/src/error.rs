//! Manager error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("engine bootstrap failed for {symbol}: {source}")]
    Bootstrap {
        symbol: String,
        #[source]
        source: helion_feed::FeedError,
    },

    #[error("registry error: {0}")]
    Registry(#[from] helion_registry::RegistryError),

    #[error("no such engine: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
