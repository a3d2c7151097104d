//! ONNX model backend (candle-onnx)
//!
//! The graph is decoded once at load time and evaluated per request with
//! `candle_onnx::simple_eval`, which only borrows the proto.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::ModelProto;
use tracing::info;

use super::model::{InferenceError, Model, ModelInputTensor, PredictionVector};

/// A classifier exported to ONNX
pub struct OnnxModel {
    name: String,
    proto: ModelProto,
    input_name: String,
    output_name: String,
}

impl OnnxModel {
    /// Load and validate an `.onnx` graph
    pub fn load(name: &str, path: &Path) -> Result<Self, InferenceError> {
        let load_error = |reason: String| InferenceError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let proto = candle_onnx::read_file(path).map_err(|e| load_error(e.to_string()))?;
        let graph = proto
            .graph
            .as_ref()
            .ok_or_else(|| load_error("no graph defined".to_string()))?;

        // Older exporters also list initializers as graph inputs
        let initializers: HashSet<&str> = graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let input_name = graph
            .input
            .iter()
            .map(|i| i.name.as_str())
            .find(|n| !initializers.contains(n))
            .ok_or_else(|| load_error("graph has no free input".to_string()))?
            .to_string();
        let output_name = graph
            .output
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| load_error("graph has no output".to_string()))?;

        info!(
            model = name,
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "Loaded ONNX model"
        );

        Ok(Self {
            name: name.to_string(),
            proto,
            input_name,
            output_name,
        })
    }
}

impl Model for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: &ModelInputTensor) -> Result<PredictionVector, InferenceError> {
        let backend = |e: candle_core::Error| InferenceError::Backend(e.to_string());

        let tensor = Tensor::from_vec(input.data().to_vec(), input.shape().to_vec(), &Device::Cpu)
            .map_err(|e| InferenceError::Shape(e.to_string()))?;

        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.clone(), tensor);

        let mut outputs = candle_onnx::simple_eval(&self.proto, inputs).map_err(backend)?;
        let output = outputs.remove(&self.output_name).ok_or_else(|| {
            InferenceError::Backend(format!("output {} not produced", self.output_name))
        })?;

        let batch = output.dims().first().copied().unwrap_or(1);
        let values = output
            .to_dtype(DType::F32)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(backend)?;

        PredictionVector::from_flat(values, batch)
    }
}
