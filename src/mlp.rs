//! Feed-forward regressor evaluated with candle.

use crate::errors::{RecommendError, RecommendResult};
use crate::matrix::FeatureMatrix;
use crate::oracle::ScoringOracle;
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module};
use std::path::Path;

/// Dense layers with ReLU between them and a single linear output.
pub struct MlpOracle {
    layers: Vec<Linear>,
    input_width: usize,
    device: Device,
}

impl MlpOracle {
    /// Build from `(weight, bias)` pairs; weight is `[out, in]`, bias `[out]`.
    pub fn from_tensors(params: Vec<(Tensor, Tensor)>) -> RecommendResult<Self> {
        Self::build(params).map_err(|message| RecommendError::model_load("<memory>", message))
    }

    /// Load tensors named `layers.{i}.weight` / `layers.{i}.bias`, `i` from 0.
    pub fn from_safetensors<P: AsRef<Path>>(path: P) -> RecommendResult<Self> {
        let display = path.as_ref().display().to_string();
        let mut tensors = candle_core::safetensors::load(path.as_ref(), &Device::Cpu)
            .map_err(|e| RecommendError::model_load(&display, e.to_string()))?;

        let mut params = Vec::new();
        while let Some(weight) = tensors.remove(&format!("layers.{}.weight", params.len())) {
            let bias_key = format!("layers.{}.bias", params.len());
            let bias = tensors
                .remove(&bias_key)
                .ok_or_else(|| RecommendError::model_load(&display, format!("missing {bias_key}")))?;
            params.push((weight, bias));
        }
        Self::build(params).map_err(|message| RecommendError::model_load(display, message))
    }

    fn build(params: Vec<(Tensor, Tensor)>) -> Result<Self, String> {
        if params.is_empty() {
            return Err("network has no layers".into());
        }
        let mut layers = Vec::with_capacity(params.len());
        let mut input_width = None;
        let mut previous_out: Option<usize> = None;

        for (i, (weight, bias)) in params.into_iter().enumerate() {
            let (out_dim, in_dim) = weight.dims2().map_err(|e| format!("layer {i} weight: {e}"))?;
            let bias_dim = bias.dims1().map_err(|e| format!("layer {i} bias: {e}"))?;
            if bias_dim != out_dim {
                return Err(format!("layer {i} bias has {bias_dim} entries for {out_dim} outputs"));
            }
            if let Some(prev) = previous_out {
                if prev != in_dim {
                    return Err(format!("layer {i} takes {in_dim} inputs but receives {prev}"));
                }
            }
            input_width.get_or_insert(in_dim);
            previous_out = Some(out_dim);

            let weight = weight.to_dtype(DType::F32).map_err(|e| e.to_string())?;
            let bias = bias.to_dtype(DType::F32).map_err(|e| e.to_string())?;
            layers.push(Linear::new(weight, Some(bias)));
        }

        if previous_out != Some(1) {
            return Err("network must end in a single output".into());
        }

        Ok(Self {
            layers,
            input_width: input_width.unwrap_or_default(),
            device: Device::Cpu,
        })
    }
}

impl ScoringOracle for MlpOracle {
    fn name(&self) -> &str {
        "mlp"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.input_width)
    }

    fn score(&self, batch: &FeatureMatrix) -> RecommendResult<Vec<f64>> {
        if batch.width() != self.input_width {
            return Err(RecommendError::oracle(
                self.name(),
                format!("expected {} inputs, got {}", self.input_width, batch.width()),
            ));
        }
        let values: Vec<f32> = batch.as_slice().iter().map(|v| *v as f32).collect();
        let mut x = Tensor::from_vec(values, (batch.rows(), batch.width()), &self.device)?;
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            if i < last {
                x = x.relu()?;
            }
        }
        let out = x.flatten_all()?.to_vec1::<f32>()?;
        Ok(out.into_iter().map(f64::from).collect())
    }
}
