//! Model registry: named models loaded once at startup, bound to endpoints

use std::collections::BTreeMap;
use std::sync::Arc;

use auscult_common::config::{BindingsConfig, ModelEntry};
use auscult_common::{Error, Result};
use tracing::{info, warn};

use super::model::{InferenceError, Model};
use super::orchestrator::Task;

/// Immutable set of loaded models, keyed by name
#[derive(Clone, Default)]
pub struct ModelSet {
    models: BTreeMap<String, Arc<dyn Model>>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model (builder style, before the set is shared)
    pub fn with_model(mut self, model: Arc<dyn Model>) -> Self {
        self.models.insert(model.name().to_string(), model);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve the model each endpoint uses
    ///
    /// Fails when a binding names a model that is not loaded. Binding both
    /// endpoints to the same model is allowed but logged, since each task
    /// normally has its own classifier.
    pub fn bind(&self, bindings: &BindingsConfig) -> Result<BoundModels> {
        let lookup = |task: Task, name: &str| {
            self.get(name).ok_or_else(|| {
                Error::Config(format!(
                    "{} endpoint is bound to model '{}', which is not loaded (available: {})",
                    task,
                    name,
                    self.names().join(", ")
                ))
            })
        };

        let cough = lookup(Task::Cough, &bindings.cough)?;
        let breath = lookup(Task::Breath, &bindings.breath)?;

        if bindings.cough == bindings.breath {
            warn!(
                model = %bindings.cough,
                "Cough and breath endpoints share one model; breath predictions will come from the {} classifier",
                bindings.cough
            );
        }

        info!(cough = %bindings.cough, breath = %bindings.breath, "Endpoint model bindings resolved");

        Ok(BoundModels { cough, breath })
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet").field("models", &self.names()).finish()
    }
}

/// The model bound to each prediction endpoint
#[derive(Clone)]
pub struct BoundModels {
    pub cough: Arc<dyn Model>,
    pub breath: Arc<dyn Model>,
}

/// Load every configured model artifact
pub fn load_models(entries: &BTreeMap<String, ModelEntry>) -> std::result::Result<ModelSet, InferenceError> {
    let mut set = ModelSet::new();
    for (name, entry) in entries {
        set = set.with_model(load_model(name, entry)?);
    }
    info!("Loaded {} model(s): {}", set.len(), set.names().join(", "));
    Ok(set)
}

#[cfg(feature = "onnx")]
fn load_model(name: &str, entry: &ModelEntry) -> std::result::Result<Arc<dyn Model>, InferenceError> {
    let model = super::onnx::OnnxModel::load(name, &entry.path)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_model(_name: &str, entry: &ModelEntry) -> std::result::Result<Arc<dyn Model>, InferenceError> {
    Err(InferenceError::Load {
        path: entry.path.clone(),
        reason: "no model backend compiled in (rebuild with `--features onnx`)".to_string(),
    })
}
