//! HTTP API handlers for auscult-api

pub mod health;
pub mod predict;

pub use health::{health_routes, BuildInfo};
pub use predict::{predict_routes, resolve_upload, PredictionResponse};
