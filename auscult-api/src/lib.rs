//! auscult-api library interface
//!
//! Respiratory sound classification service: uploaded cough or breath
//! recordings are turned into a fixed MFCC tensor and scored by a
//! pre-trained model.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;

pub use crate::error::{RequestError, RequestResult};

use std::sync::Arc;

use auscult_common::config::{BindingsConfig, DEFAULT_FIELD_NAME, DEFAULT_MAX_UPLOAD_BYTES};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::features::AudioFeatureExtractor;
use crate::inference::{InferenceOrchestrator, ModelSet, Task};

/// Application state shared across handlers
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator bound to the cough model
    pub cough: Arc<InferenceOrchestrator>,
    /// Orchestrator bound to the breath model
    pub breath: Arc<InferenceOrchestrator>,
    /// Multipart field carrying the upload
    pub field_name: Arc<str>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(cough: InferenceOrchestrator, breath: InferenceOrchestrator) -> Self {
        Self {
            cough: Arc::new(cough),
            breath: Arc::new(breath),
            field_name: Arc::from(DEFAULT_FIELD_NAME),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    /// Bind each task to its configured model and share one extractor
    pub fn from_models(
        models: &ModelSet,
        bindings: &BindingsConfig,
        extractor: Arc<AudioFeatureExtractor>,
    ) -> auscult_common::Result<Self> {
        let bound = models.bind(bindings)?;
        Ok(Self::new(
            InferenceOrchestrator::new(Task::Cough, bound.cough, Arc::clone(&extractor)),
            InferenceOrchestrator::new(Task::Breath, bound.breath, extractor),
        ))
    }

    pub fn with_upload_limits(mut self, field_name: &str, max_upload_bytes: usize) -> Self {
        self.field_name = Arc::from(field_name);
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
