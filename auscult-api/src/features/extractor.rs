//! Audio feature extractor: uploaded bytes → MFCC matrix

use tracing::debug;

use super::{FeatureMatrix, FeatureParams, MfccComputer};
use crate::audio::{decode_audio_bytes, resample_mono, AudioBuffer, ExtractionError, NormalizedWaveform};

/// Extra source audio decoded past the window, so the resampler has real
/// signal (not zeros) under its filter at the end of the window
const DECODE_MARGIN_SECONDS: f64 = 1.0;

/// Stateless transform from an [`AudioBuffer`] to a [`FeatureMatrix`]
///
/// Holds only precomputed, read-only tables; safe to share across requests.
#[derive(Debug)]
pub struct AudioFeatureExtractor {
    params: FeatureParams,
    mfcc: MfccComputer,
}

impl AudioFeatureExtractor {
    pub fn new(params: FeatureParams) -> Result<Self, ExtractionError> {
        let mfcc = MfccComputer::new(&params)?;
        Ok(Self { params, mfcc })
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Expected `(coefficients, frames)` of every extracted matrix
    pub fn output_shape(&self) -> (usize, usize) {
        (self.params.n_mfcc, self.params.n_frames())
    }

    /// Decode, resample, fit to the fixed window and peak-normalize
    pub fn normalize(&self, buffer: &AudioBuffer) -> Result<NormalizedWaveform, ExtractionError> {
        let extension = buffer.extension();
        let max_seconds = self.params.duration_seconds as f64 + DECODE_MARGIN_SECONDS;

        let decoded = decode_audio_bytes(buffer.bytes().clone(), extension.as_deref(), Some(max_seconds))?;
        let source_rate = decoded.sample_rate;
        let source_samples = decoded.samples.len();

        let samples = resample_mono(decoded.samples, source_rate, self.params.sample_rate)?;

        debug!(
            source_rate,
            source_samples,
            resampled_samples = samples.len(),
            target_length = self.params.target_length(),
            "Fitting waveform to analysis window"
        );

        Ok(NormalizedWaveform::new(
            samples,
            self.params.sample_rate,
            self.params.duration_seconds,
        ))
    }

    /// Full pipeline: normalized waveform → MFCC matrix
    pub fn extract(&self, buffer: &AudioBuffer) -> Result<FeatureMatrix, ExtractionError> {
        let waveform = self.normalize(buffer)?;
        self.features(&waveform)
    }

    /// MFCCs of an already normalized waveform
    pub fn features(&self, waveform: &NormalizedWaveform) -> Result<FeatureMatrix, ExtractionError> {
        let matrix = self.mfcc.compute(waveform.samples())?;

        if matrix.shape() != self.output_shape() {
            return Err(ExtractionError::Feature(format!(
                "expected feature shape {:?}, got {:?}",
                self.output_shape(),
                matrix.shape()
            )));
        }

        Ok(matrix)
    }
}
