//! Model capability, registry and per-task orchestration

pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod orchestrator;
pub mod registry;

pub use model::{InferenceError, Model, ModelInputTensor, PredictionVector};
pub use orchestrator::{InferenceOrchestrator, Task, UploadOutcome};
pub use registry::{load_models, BoundModels, ModelSet};
