//! Audio ingestion: decoding uploaded bytes, resampling, fixed-window shaping
//!
//! Everything here is request scoped. Buffers are owned values and are
//! released when the request finishes, on success and failure alike.

pub mod decoder;
pub mod resampler;
pub mod waveform;

pub use decoder::{decode_audio_bytes, DecodedAudio};
pub use resampler::resample_mono;
pub use waveform::NormalizedWaveform;

use axum::body::Bytes;
use thiserror::Error;

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Bytes could not be parsed as audio
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Sample-rate conversion failed
    #[error("Failed to resample audio: {0}")]
    Resample(String),

    /// Spectral feature computation failed
    #[error("Failed to compute features: {0}")]
    Feature(String),
}

/// One uploaded file held in memory
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    bytes: Bytes,
    filename: Option<String>,
}

impl AudioBuffer {
    pub fn new(bytes: impl Into<Bytes>, filename: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Lower-cased filename extension, used as a container format hint
    pub fn extension(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}
