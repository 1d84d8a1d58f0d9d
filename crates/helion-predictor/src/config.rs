//! Ensemble weighting and entry-threshold configuration.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictorWeights {
    pub tabular: f64,
    pub sequence: f64,
    pub auxiliary: f64,
}

impl Default for PredictorWeights {
    fn default() -> Self {
        Self {
            tabular: 0.5,
            sequence: 0.3,
            auxiliary: 0.2,
        }
    }
}

impl PredictorWeights {
    pub fn validate(&self) -> Result<()> {
        let sum = self.tabular + self.sequence + self.auxiliary;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(PredictorError::InvalidWeights(sum));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub weights: PredictorWeights,
    #[serde(default = "default_threshold_entry")]
    pub threshold_entry: f64,
    /// Required feature keys the loaded model manifest expects. A `Predict`
    /// call with a feature map missing any of these fails with
    /// `PredictorError::Feature`.
    pub required_features: Vec<String>,
}

fn default_threshold_entry() -> f64 {
    0.55
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            weights: PredictorWeights::default(),
            threshold_entry: default_threshold_entry(),
            required_features: Vec::new(),
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(0.5..=1.0).contains(&self.threshold_entry) {
            return Err(PredictorError::InvalidWeights(self.threshold_entry));
        }
        Ok(())
    }
}
