//! Mel-frequency cepstral coefficients
//!
//! **Algorithm:**
//! 1. Centered STFT: pad `n_fft / 2` zeros on both sides, periodic Hann window
//! 2. Power spectrum `|X|²`
//! 3. Slaney-style mel filterbank (Slaney mel scale, area-normalized bands)
//! 4. Power to dB, floored at `amin` and clipped to `max - top_db`
//! 5. Orthonormal DCT-II across mel bands, first `n_mfcc` rows kept
//!
//! Window, filterbank, DCT basis and FFT plan are built once in
//! [`MfccComputer::new`]; `compute` only reads them, so one instance can be
//! shared by concurrent requests.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::{FeatureMatrix, FeatureParams};
use crate::audio::ExtractionError;

/// Power floor before taking the logarithm
const AMIN: f64 = 1e-10;

// Slaney mel scale: linear below 1 kHz, logarithmic above
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Hz to mel (Slaney scale)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Mel to Hz (Slaney scale)
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// One triangular mel filter, stored from its first non-zero FFT bin
#[derive(Debug, Clone)]
struct MelBand {
    start: usize,
    weights: Vec<f64>,
}

/// Precomputed MFCC pipeline for one set of [`FeatureParams`]
pub struct MfccComputer {
    n_fft: usize,
    hop_length: usize,
    n_mfcc: usize,
    n_mels: usize,
    top_db: Option<f64>,
    window: Vec<f32>,
    mel_bands: Vec<MelBand>,
    /// `n_mfcc × n_mels`, row-major
    dct_basis: Vec<f64>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for MfccComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MfccComputer")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .field("n_mfcc", &self.n_mfcc)
            .field("n_mels", &self.n_mels)
            .finish()
    }
}

impl MfccComputer {
    pub fn new(params: &FeatureParams) -> Result<Self, ExtractionError> {
        let nyquist = params.sample_rate as f64 / 2.0;
        let fmax = params.fmax();

        if params.sample_rate == 0 {
            return Err(ExtractionError::Feature("sample rate must be positive".to_string()));
        }
        if params.n_fft < 2 || params.hop_length == 0 {
            return Err(ExtractionError::Feature(format!(
                "invalid STFT parameters: n_fft={}, hop_length={}",
                params.n_fft, params.hop_length
            )));
        }
        if params.n_mfcc == 0 || params.n_mfcc > params.n_mels {
            return Err(ExtractionError::Feature(format!(
                "n_mfcc must be in 1..={}, got {}",
                params.n_mels, params.n_mfcc
            )));
        }
        if !(params.fmin >= 0.0 && params.fmin < fmax && fmax <= nyquist) {
            return Err(ExtractionError::Feature(format!(
                "invalid filterbank range {} Hz - {} Hz",
                params.fmin, fmax
            )));
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(params.n_fft);

        Ok(Self {
            n_fft: params.n_fft,
            hop_length: params.hop_length,
            n_mfcc: params.n_mfcc,
            n_mels: params.n_mels,
            top_db: params.top_db,
            window: hann_window(params.n_fft),
            mel_bands: mel_filterbank(params.sample_rate, params.n_fft, params.n_mels, params.fmin, fmax),
            dct_basis: dct_ortho_basis(params.n_mfcc, params.n_mels),
            fft,
        })
    }

    /// Number of frames produced for `num_samples` input samples
    pub fn frame_count(&self, num_samples: usize) -> usize {
        1 + num_samples / self.hop_length
    }

    /// Compute the MFCC matrix of `samples`
    pub fn compute(&self, samples: &[f32]) -> Result<FeatureMatrix, ExtractionError> {
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(ExtractionError::Feature(format!(
                "non-finite sample at index {}",
                index
            )));
        }

        let half = self.n_fft / 2;
        let n_bins = self.n_fft / 2 + 1;
        let n_frames = self.frame_count(samples.len());

        let mut padded = vec![0.0f32; samples.len() + self.n_fft];
        padded[half..half + samples.len()].copy_from_slice(samples);

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0f64; n_bins];

        // [mel][frame]
        let mut log_mel = vec![0.0f64; self.n_mels * n_frames];

        for t in 0..n_frames {
            let start = t * self.hop_length;
            let frame = &padded[start..start + self.n_fft];

            for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(x * w, 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (p, c) in power.iter_mut().zip(&buffer[..n_bins]) {
                *p = c.norm_sqr() as f64;
            }

            for (m, band) in self.mel_bands.iter().enumerate() {
                let energy: f64 = band
                    .weights
                    .iter()
                    .zip(&power[band.start..])
                    .map(|(w, p)| w * p)
                    .sum();
                log_mel[m * n_frames + t] = 10.0 * energy.max(AMIN).log10();
            }
        }

        if let Some(top_db) = self.top_db {
            let max_db = log_mel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let floor = max_db - top_db;
            for value in log_mel.iter_mut() {
                *value = value.max(floor);
            }
        }

        let mut data = vec![0.0f32; self.n_mfcc * n_frames];
        for c in 0..self.n_mfcc {
            let basis = &self.dct_basis[c * self.n_mels..(c + 1) * self.n_mels];
            for t in 0..n_frames {
                let acc: f64 = basis
                    .iter()
                    .enumerate()
                    .map(|(m, b)| b * log_mel[m * n_frames + t])
                    .sum();
                data[c * n_frames + t] = acc as f32;
            }
        }

        FeatureMatrix::from_vec(self.n_mfcc, n_frames, data).ok_or_else(|| {
            ExtractionError::Feature("feature matrix size mismatch".to_string())
        })
    }
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos()) as f32)
        .collect()
}

/// Triangular mel filters with Slaney area normalization
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Vec<MelBand> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
            let enorm = 2.0 / (right - left);

            let weights: Vec<f64> = fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - left) / (center - left);
                    let upper = (right - f) / (right - center);
                    lower.min(upper).max(0.0) * enorm
                })
                .collect();

            let start = weights.iter().position(|w| *w > 0.0).unwrap_or(n_bins);
            let end = weights.iter().rposition(|w| *w > 0.0).map_or(start, |i| i + 1);

            MelBand {
                start,
                weights: weights[start..end].to_vec(),
            }
        })
        .collect()
}

/// Orthonormal DCT-II basis, `n_out × n_in`
fn dct_ortho_basis(n_out: usize, n_in: usize) -> Vec<f64> {
    let n = n_in as f64;
    let mut basis = Vec::with_capacity(n_out * n_in);
    for k in 0..n_out {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for i in 0..n_in {
            basis.push(scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos());
        }
    }
    basis
}
