//! Stateless (after load) inference: feature map in, calibrated probability
//! and discrete side out.

use crate::config::PredictorConfig;
use crate::error::{PredictorError, Result};
use crate::model::{artifact_exists, LinearScorer, ModelPaths, Scorer};
use helion_core::{Features, Prediction, Side};
use std::sync::Arc;
use tracing::warn;

pub struct EnsemblePredictor {
    config: PredictorConfig,
    tabular: Option<Arc<dyn Scorer>>,
    sequence: Option<Arc<dyn Scorer>>,
}

impl EnsemblePredictor {
    /// Reads the two model artifacts named by `paths`, establishes the
    /// required feature key set from `config`, and validates weight/
    /// threshold bounds. Fails with `PredictorError::ModelLoad` if either
    /// artifact is missing — the caller is expected to fall back to
    /// [`EnsemblePredictor::degraded`] rather than crash the engine.
    pub fn load(config: PredictorConfig, paths: &ModelPaths) -> Result<Self> {
        config.validate()?;
        if !artifact_exists(&paths.tabular) {
            return Err(PredictorError::ModelLoad(paths.tabular.display().to_string()));
        }
        if !artifact_exists(&paths.sequence) {
            return Err(PredictorError::ModelLoad(paths.sequence.display().to_string()));
        }
        let tabular: Arc<dyn Scorer> = Arc::new(LinearScorer::new(config.required_features.clone()));
        let sequence: Arc<dyn Scorer> = Arc::new(LinearScorer::new(config.required_features.clone()));
        Self::from_scorers(config, tabular, sequence)
    }

    /// Constructs directly from scorer implementations, bypassing artifact
    /// existence checks. Used by tests and by callers that load models
    /// through a non-filesystem path.
    pub fn from_scorers(
        config: PredictorConfig,
        tabular: Arc<dyn Scorer>,
        sequence: Arc<dyn Scorer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tabular: Some(tabular),
            sequence: Some(sequence),
        })
    }

    /// A predictor that always returns `FLAT`. Entered when model artifacts
    /// are absent at startup — the engine stays up and observable, it just
    /// never emits a signal.
    pub fn degraded(config: PredictorConfig) -> Self {
        Self {
            config,
            tabular: None,
            sequence: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.tabular.is_none()
    }

    /// Deterministic for identical inputs. `auxiliary_score` is expected in
    /// `[-1, 1]`; out-of-range values are clamped rather than rejected.
    pub fn predict(&self, features: &Features, auxiliary_score: f64) -> Result<Prediction> {
        let (Some(tabular), Some(sequence)) = (&self.tabular, &self.sequence) else {
            return Ok(Prediction::flat());
        };

        for key in &self.config.required_features {
            if !features.contains_key(key) {
                return Err(PredictorError::Feature(key.clone()));
            }
        }

        let p_tabular = tabular.score(features);
        let p_sequence = sequence.score(features);
        let aux_component = (auxiliary_score.clamp(-1.0, 1.0) + 1.0) / 2.0;
        let weights = &self.config.weights;
        let prob_up = weights.tabular * p_tabular
            + weights.sequence * p_sequence
            + weights.auxiliary * aux_component;

        let threshold = self.config.threshold_entry;
        let side = if prob_up >= threshold {
            Side::Long
        } else if prob_up <= 1.0 - threshold {
            Side::Short
        } else {
            Side::Flat
        };

        let confidence = 2.0 * (prob_up - 0.5).abs();
        let size_fraction = if side == Side::Flat {
            0.0
        } else {
            (0.5 + 0.5 * confidence).clamp(0.5, 1.0)
        };

        if !(0.0..=1.0).contains(&prob_up) {
            warn!(prob_up, "prob_up outside [0,1], weights may not be normalized correctly");
        }

        Ok(Prediction {
            prob_up,
            confidence,
            side,
            size_fraction,
        })
    }
}
