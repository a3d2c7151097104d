//! Stand-in models for router tests

use std::sync::atomic::{AtomicUsize, Ordering};

use auscult_api::inference::{InferenceError, Model, ModelInputTensor, PredictionVector};

/// Returns fixed scores and counts calls
pub struct ConstantModel {
    name: String,
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl ConstantModel {
    pub fn new(name: &str, scores: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Model for ConstantModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: &ModelInputTensor) -> Result<PredictionVector, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let [batch, coefficients, _, channels] = input.shape();
        if batch != 1 || coefficients != 13 || channels != 1 {
            return Err(InferenceError::Shape(format!("{:?}", input.shape())));
        }
        Ok(PredictionVector(vec![self.scores.clone()]))
    }
}

/// Always fails inside the backend
pub struct FailingModel;

impl Model for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _input: &ModelInputTensor) -> Result<PredictionVector, InferenceError> {
        Err(InferenceError::Backend("internal node MatMul_7 failed".to_string()))
    }
}
