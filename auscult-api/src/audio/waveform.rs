//! Fixed-length, peak-normalized waveform

/// Mono waveform of exactly `sample_rate × duration_seconds` samples,
/// scaled so its peak absolute amplitude is 1.0 (silence stays silent)
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWaveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl NormalizedWaveform {
    /// Fit `samples` to the fixed window and normalize the peak
    ///
    /// Longer input keeps only its first `target_length` samples; shorter
    /// input is right-padded with zeros.
    pub fn new(samples: Vec<f32>, sample_rate: u32, duration_seconds: u32) -> Self {
        let target_length = sample_rate as usize * duration_seconds as usize;
        let mut samples = fit_to_length(samples, target_length);
        normalize_peak(&mut samples);
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Prefix-truncate or right zero-pad to exactly `target_length`
pub fn fit_to_length(mut samples: Vec<f32>, target_length: usize) -> Vec<f32> {
    samples.resize(target_length, 0.0);
    samples
}

/// Scale so `max |x| == 1.0`
///
/// Peaks below the smallest normal f32 (including all-zero input) are left
/// untouched, so silence never divides by zero.
pub fn normalize_peak(samples: &mut [f32]) {
    let peak = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0f32, |acc, s| acc.max(s.abs()));

    if peak < f32::MIN_POSITIVE {
        return;
    }

    for sample in samples.iter_mut() {
        *sample /= peak;
    }
}
