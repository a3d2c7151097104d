//! Sample-rate conversion for mono PCM

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use super::ExtractionError;

/// Upper bound on silent chunks fed to drain the filter
const MAX_FLUSHES: usize = 1024;

/// Resample mono PCM samples from `source_rate` to `target_rate`
///
/// **Algorithm:**
/// - Sinc interpolation with BlackmanHarris2 window
/// - 256-tap filter, 0.95 cutoff to prevent aliasing
/// - Whole input processed as a single chunk, then silent chunks are fed
///   until the filter delay and the full signal have come out
/// - Filter delay is trimmed so output sample 0 aligns with input sample 0
///
/// Output length is `ceil(len × target_rate / source_rate)`.
pub fn resample_mono(
    samples: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, ExtractionError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples);
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(ExtractionError::Resample(format!(
            "invalid sample rates {} Hz → {} Hz",
            source_rate, target_rate
        )));
    }

    let num_frames = samples.len();
    let resample_ratio = target_rate as f64 / source_rate as f64;
    let expected_len = (num_frames as f64 * resample_ratio).ceil() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        resample_ratio,
        1.0, // Fixed ratio, no runtime adjustment
        params,
        num_frames, // Chunk size = input length
        1,
    )
    .map_err(|e| ExtractionError::Resample(format!("failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();

    let input_channels = vec![samples];
    let mut output = resampler
        .process(&input_channels, None)
        .map_err(|e| ExtractionError::Resample(e.to_string()))?
        .swap_remove(0);

    // Flush the samples still held back by the filter delay. Short inputs
    // need several chunks of silence before the delay is cleared.
    let needed = delay + expected_len;
    let mut flushes = 0;
    while output.len() < needed {
        if flushes == MAX_FLUSHES {
            return Err(ExtractionError::Resample(format!(
                "resampler produced {} of {} frames",
                output.len(),
                needed
            )));
        }
        let tail = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| ExtractionError::Resample(e.to_string()))?
            .swap_remove(0);
        output.extend_from_slice(&tail);
        flushes += 1;
    }

    let mut aligned: Vec<f32> = output.into_iter().skip(delay).collect();
    aligned.truncate(expected_len);

    debug!(
        "Resampled {} frames ({} Hz) → {} frames ({} Hz)",
        num_frames,
        source_rate,
        aligned.len(),
        target_rate
    );

    Ok(aligned)
}
