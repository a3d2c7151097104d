//! Opaque model capability and its input/output types

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::features::FeatureMatrix;

/// Model invocation errors
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Input tensor does not match what the model accepts
    #[error("Invalid input shape: {0}")]
    Shape(String),

    /// Backend failed while evaluating the model
    #[error("Model evaluation failed: {0}")]
    Backend(String),

    /// Model artifact could not be loaded
    #[error("Failed to load model {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// A pre-trained classifier exposing only inference
///
/// Implementations are loaded once and never mutated, so `predict` takes
/// `&self` and may be called from many requests at once.
pub trait Model: Send + Sync {
    /// Name this model was registered under
    fn name(&self) -> &str;

    /// Class scores for a `[1, 13, frames, 1]` feature tensor
    fn predict(&self, input: &ModelInputTensor) -> Result<PredictionVector, InferenceError>;
}

/// Feature matrix with a leading batch axis and trailing channel axis:
/// `[1, coefficients, frames, 1]`, flat row-major `f32`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl ModelInputTensor {
    /// Add batch and channel axes around a feature matrix
    pub fn from_features(features: FeatureMatrix) -> Self {
        let (coefficients, frames) = features.shape();
        Self {
            shape: [1, coefficients, frames, 1],
            data: features.into_vec(),
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `[batch, coefficient, frame, channel]`
    pub fn get(&self, index: [usize; 4]) -> Option<f32> {
        if index.iter().zip(self.shape.iter()).any(|(i, dim)| i >= dim) {
            return None;
        }
        let [_, c, f, ch] = self.shape;
        let flat = ((index[0] * c + index[1]) * f + index[2]) * ch + index[3];
        self.data.get(flat).copied()
    }
}

/// Class scores as returned by the model, one row per batch entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionVector(pub Vec<Vec<f32>>);

impl PredictionVector {
    /// Split a flat output into `batch` rows of equal width
    pub fn from_flat(values: Vec<f32>, batch: usize) -> Result<Self, InferenceError> {
        if batch == 0 || values.len() % batch != 0 {
            return Err(InferenceError::Shape(format!(
                "cannot split {} scores into {} rows",
                values.len(),
                batch
            )));
        }
        let width = values.len() / batch;
        if width == 0 {
            return Ok(Self(vec![Vec::new(); batch]));
        }
        Ok(Self(values.chunks(width).map(<[f32]>::to_vec).collect()))
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.0
    }
}
