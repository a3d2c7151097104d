//! Audio Decoding Utilities
//!
//! **Purpose:** Decode uploaded audio bytes to mono f32 PCM samples
//!
//! Uses symphonia for format-agnostic decoding (WAV, MP3, FLAC, OGG, AAC, etc.)

use std::io::Cursor;

use axum::body::Bytes;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::ExtractionError;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count (0 if no packet was decoded)
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode in-memory audio bytes to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Probe container format (content sniffing, extension as a hint)
/// 2. Find default audio track
/// 3. Create decoder for track codec
/// 4. Decode packets to PCM, averaging channels to mono
/// 5. Stop once `max_seconds` of audio has been collected, if given
///
/// Corrupt packets are skipped as long as at least one packet decodes.
///
/// # Errors
/// * `ExtractionError::Decode` - unrecognized format, no audio track,
///   unknown sample rate, or no decodable packet
pub fn decode_audio_bytes(
    bytes: Bytes,
    extension: Option<&str>,
    max_seconds: Option<f64>,
) -> Result<DecodedAudio, ExtractionError> {
    tracing::debug!(bytes = bytes.len(), extension = ?extension, "Decoding audio upload");

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ExtractionError::Decode(format!("unrecognized audio format ({})", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ExtractionError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| ExtractionError::Decode("sample rate unknown".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ExtractionError::Decode(format!("unsupported codec ({})", e)))?;

    let max_frames = max_seconds.map(|seconds| (seconds * sample_rate as f64).ceil() as usize);

    let mut all_samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channels = 0usize;
    let mut decoded_packets = 0usize;
    let mut failed_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of stream
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(ExtractionError::Decode(format!("error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::debug!(error = msg, "Skipping corrupt packet");
                failed_packets += 1;
                continue;
            }
            Err(e) => {
                return Err(ExtractionError::Decode(format!("failed to decode packet: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count().max(1);
        channels = channel_count;

        let needs_alloc = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channel_count);
        if needs_alloc {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        decoded_packets += 1;

        downmix_into(buf.samples(), channel_count, &mut all_samples);

        if let Some(max_frames) = max_frames {
            if all_samples.len() >= max_frames {
                all_samples.truncate(max_frames);
                break;
            }
        }
    }

    if decoded_packets == 0 && failed_packets > 0 {
        return Err(ExtractionError::Decode(format!(
            "none of {} audio packets could be decoded",
            failed_packets
        )));
    }

    tracing::debug!(
        total_samples = all_samples.len(),
        sample_rate,
        channels,
        skipped_packets = failed_packets,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: all_samples,
        sample_rate,
        channels,
    })
}

/// Average interleaved frames to mono and append to `out`
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }

    out.reserve(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        let sum: f32 = frame.iter().sum();
        out.push(sum / channels as f32);
    }
}
