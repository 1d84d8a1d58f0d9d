//! Predictor error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("model artifact missing: {0}")]
    ModelLoad(String),

    #[error("weights must sum to 1.0, got {0}")]
    InvalidWeights(f64),

    #[error("malformed feature map: missing key {0}")]
    Feature(String),
}

pub type Result<T> = std::result::Result<T, PredictorError>;
