//! Error types for auscult-api
//!
//! Every failure a prediction request can hit ends here and is rendered as
//! `{"error": "<message>"}`. Nothing below the handler is allowed to panic
//! the process or leak backend details to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::audio::ExtractionError;

/// Request handling error
#[derive(Debug, Error)]
pub enum RequestError {
    /// No file field in the form (400)
    #[error("No file part in the request")]
    MissingFilePart,

    /// File field present but no file chosen (400)
    #[error("No selected file")]
    EmptySelection,

    /// Multipart stream could not be read (400)
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// Upload exceeds the configured body limit (413)
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    /// Bytes are not parsable audio (400)
    #[error("{0}")]
    Decode(String),

    /// Any other feature extraction failure (400)
    #[error("{0}")]
    Processing(String),

    /// Model evaluation failed (500); detail is logged, not returned
    #[error("Inference failed")]
    Inference(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MissingFilePart
            | RequestError::EmptySelection
            | RequestError::MalformedUpload(_)
            | RequestError::Decode(_)
            | RequestError::Processing(_) => StatusCode::BAD_REQUEST,
            RequestError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExtractionError> for RequestError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Decode(_) => RequestError::Decode(err.to_string()),
            ExtractionError::Resample(_) | ExtractionError::Feature(_) => {
                RequestError::Processing(err.to_string())
            }
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type RequestResult<T> = Result<T, RequestError>;
