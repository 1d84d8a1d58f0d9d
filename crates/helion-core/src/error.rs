//! Error types for helion-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("invalid engine state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
