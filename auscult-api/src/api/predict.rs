//! Prediction endpoints
//!
//! POST /cough_predict, POST /breath_predict
//!
//! Body: multipart form with one file field. Success returns
//! `{"predictions": [[...]]}`; failures go through [`RequestError`].

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::audio::AudioBuffer;
use crate::error::{RequestError, RequestResult};
use crate::inference::{InferenceOrchestrator, PredictionVector, Task, UploadOutcome};
use crate::AppState;

/// Successful prediction response
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predictions: PredictionVector,
}

/// Resolve the multipart body to an [`UploadOutcome`]
///
/// A field named `field_name` counts as the file part only when it carries a
/// filename; without one it is a plain form field. A body that is not
/// multipart at all has no file part.
pub async fn resolve_upload(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
) -> RequestResult<UploadOutcome> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(reason = %rejection, "Request body is not multipart");
            return Ok(UploadOutcome::Missing);
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Ok(UploadOutcome::EmptySelection);
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        debug!(filename = %filename, bytes = bytes.len(), "Received upload");
        return Ok(UploadOutcome::Present(AudioBuffer::new(bytes, Some(filename))));
    }

    Ok(UploadOutcome::Missing)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> RequestError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RequestError::UploadTooLarge(err.body_text())
    } else {
        RequestError::MalformedUpload(err.body_text())
    }
}

async fn predict(
    orchestrator: &InferenceOrchestrator,
    field_name: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> RequestResult<Json<PredictionResponse>> {
    let span = tracing::info_span!(
        "predict",
        task = %orchestrator.task(),
        request_id = %Uuid::new_v4()
    );

    async move {
        let upload = resolve_upload(multipart, field_name).await?;
        let predictions = orchestrator.handle(upload).await?;
        Ok(Json(PredictionResponse { predictions }))
    }
    .instrument(span)
    .await
}

/// POST /cough_predict
pub async fn cough_predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RequestResult<Json<PredictionResponse>> {
    predict(&state.cough, &state.field_name, multipart).await
}

/// POST /breath_predict
pub async fn breath_predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RequestResult<Json<PredictionResponse>> {
    predict(&state.breath, &state.field_name, multipart).await
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route(Task::Cough.route(), post(cough_predict))
        .route(Task::Breath.route(), post(breath_predict))
}
