//! Spectral features for the classifiers
//!
//! The models were trained on 13 MFCCs over a fixed 5 second window at
//! 22050 Hz, so every parameter here is part of the model input contract.

pub mod extractor;
pub mod mfcc;

pub use extractor::AudioFeatureExtractor;
pub use mfcc::MfccComputer;

/// Fixed feature extraction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureParams {
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Analysis window length in seconds
    pub duration_seconds: u32,
    /// Number of cepstral coefficients kept
    pub n_mfcc: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// FFT size (and window length)
    pub n_fft: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Lowest filterbank frequency in Hz
    pub fmin: f64,
    /// Highest filterbank frequency in Hz (None = Nyquist)
    pub fmax: Option<f64>,
    /// Dynamic range kept below the loudest bin, in dB
    pub top_db: Option<f64>,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            duration_seconds: 5,
            n_mfcc: 13,
            n_mels: 128,
            n_fft: 2048,
            hop_length: 512,
            fmin: 0.0,
            fmax: None,
            top_db: Some(80.0),
        }
    }
}

impl FeatureParams {
    /// Samples in the normalized waveform
    pub fn target_length(&self) -> usize {
        self.sample_rate as usize * self.duration_seconds as usize
    }

    /// Frames produced by a centered STFT over the normalized waveform
    pub fn n_frames(&self) -> usize {
        1 + self.target_length() / self.hop_length
    }

    pub fn fmax(&self) -> f64 {
        self.fmax.unwrap_or(self.sample_rate as f64 / 2.0)
    }
}

/// MFCC matrix, coefficient-major (`n_coefficients × n_frames`)
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_coefficients: usize,
    n_frames: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    /// Build from row-major data; `data.len()` must equal `rows × cols`
    pub fn from_vec(n_coefficients: usize, n_frames: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != n_coefficients * n_frames {
            return None;
        }
        Some(Self {
            n_coefficients,
            n_frames,
            data,
        })
    }

    pub fn n_coefficients(&self) -> usize {
        self.n_coefficients
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// `(coefficients, frames)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_coefficients, self.n_frames)
    }

    pub fn get(&self, coefficient: usize, frame: usize) -> Option<f32> {
        if coefficient >= self.n_coefficients || frame >= self.n_frames {
            return None;
        }
        Some(self.data[coefficient * self.n_frames + frame])
    }

    /// All frames of one coefficient
    pub fn row(&self, coefficient: usize) -> &[f32] {
        let start = coefficient * self.n_frames;
        &self.data[start..start + self.n_frames]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
