//! Inference oracle contract and the scoring adapter around it.
//!
//! The trained model is injected as an `Arc<dyn ScoringOracle>`; nothing in
//! the pipeline reaches for a process-wide model. Implementations must be safe
//! to call concurrently from independent requests.

use crate::config::{ModelConfig, ModelKind};
use crate::errors::{RecommendError, RecommendResult};
use crate::forest::ForestOracle;
use crate::matrix::FeatureMatrix;
use crate::mlp::MlpOracle;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A trained regressor scoring each matrix row
pub trait ScoringOracle: Send + Sync {
    /// Identifier used in logs and errors
    fn name(&self) -> &str;

    /// Number of inputs per row, if the model fixes one
    fn input_width(&self) -> Option<usize>;

    /// One prediction per row, in row order
    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>>;
}

/// Score a batch, insisting on exactly one finite score per row.
pub fn score_batch(oracle: &dyn ScoringOracle, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
    let scores = oracle.score(batch)?;
    if scores.len() != batch.rows() {
        return Err(RecommendError::oracle(
            oracle.name(),
            format!("returned {} scores for {} rows", scores.len(), batch.rows()),
        ));
    }
    if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
        return Err(RecommendError::oracle(
            oracle.name(),
            format!("non-finite score {} at row {}", scores[idx], idx),
        ));
    }
    debug!(oracle = oracle.name(), rows = batch.rows(), "batch scored");
    Ok(scores)
}

/// Score the single baseline row. Takes the last value of the output.
pub fn score_baseline(oracle: &dyn ScoringOracle, baseline: &FeatureMatrix) -> RecommendResult<f64> {
    let scores = score_batch(oracle, baseline)?;
    scores
        .last()
        .copied()
        .ok_or_else(|| RecommendError::oracle(oracle.name(), "baseline produced no score"))
}

/// Scores each row as the plain sum of its values. Test stub.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOracle;

impl ScoringOracle for SumOracle {
    fn name(&self) -> &str {
        "sum"
    }

    fn input_width(&self) -> Option<usize> {
        None
    }

    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
        Ok(batch.iter_rows().map(|row| row.iter().sum()).collect())
    }
}

/// Linear regressor: `bias + sum(weight_i * x_i)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearOracle {
    pub bias: f64,
    pub weights: Vec<f64>,
}

impl LinearOracle {
    pub fn new(bias: f64, weights: Vec<f64>) -> Self {
        Self { bias, weights }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RecommendResult<Self> {
        let model: Self = read_json(path.as_ref())?;
        if model.weights.is_empty() {
            return Err(RecommendError::model_load(
                path.as_ref().display().to_string(),
                "linear model has no weights",
            ));
        }
        if !model.bias.is_finite() || model.weights.iter().any(|w| !w.is_finite()) {
            return Err(RecommendError::model_load(
                path.as_ref().display().to_string(),
                "linear model has non-finite parameters",
            ));
        }
        Ok(model)
    }
}

impl ScoringOracle for LinearOracle {
    fn name(&self) -> &str {
        "linear"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
        if batch.width() != self.weights.len() {
            return Err(RecommendError::oracle(
                self.name(),
                format!("expected {} inputs, got {}", self.weights.len(), batch.width()),
            ));
        }
        Ok(batch
            .iter_rows()
            .map(|row| {
                self.bias
                    + row
                        .iter()
                        .zip(&self.weights)
                        .map(|(x, w)| x * w)
                        .sum::<f64>()
            })
            .collect())
    }
}

type ScoreFn = dyn Fn(&FeatureMatrix) -> RecommendResult<Vec<f64>> + Send + Sync;

/// Adapts a plain scoring function to the oracle contract
pub struct FnOracle {
    name: String,
    input_width: Option<usize>,
    score_fn: Box<ScoreFn>,
}

impl FnOracle {
    pub fn new<F>(name: impl Into<String>, input_width: Option<usize>, score_fn: F) -> Self
    where
        F: Fn(&FeatureMatrix) -> RecommendResult<Vec<f64>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input_width,
            score_fn: Box::new(score_fn),
        }
    }
}

impl ScoringOracle for FnOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
        (self.score_fn)(batch)
    }
}

/// Load the oracle selected by configuration
pub fn load_oracle(config: &ModelConfig) -> RecommendResult<Arc<dyn ScoringOracle>> {
    let oracle: Arc<dyn ScoringOracle> = match config.kind {
        ModelKind::Sum => Arc::new(SumOracle),
        ModelKind::Linear => Arc::new(LinearOracle::from_file(config.require_path()?)?),
        ModelKind::Forest => Arc::new(ForestOracle::from_file(config.require_path()?)?),
        ModelKind::Mlp => Arc::new(MlpOracle::from_safetensors(config.require_path()?)?),
    };
    info!(
        oracle = oracle.name(),
        input_width = ?oracle.input_width(),
        "scoring oracle loaded"
    );
    Ok(oracle)
}

/// Read a JSON model artifact
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> RecommendResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| RecommendError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&content)
        .map_err(|e| RecommendError::model_load(path.display().to_string(), e.to_string()))
}
