//! Health error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

pub type Result<T> = std::result::Result<T, HealthError>;
