//! Audio Test Fixture Generator
//!
//! Builds WAV files in memory with hound

use std::io::Cursor;

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Tone frequency in Hz
    pub frequency: f64,
    /// Peak amplitude (0.0 = silence)
    pub amplitude: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 3.0,
            sample_rate: 22050,
            channels: 1,
            frequency: 440.0,
            amplitude: 0.3,
        }
    }
}

impl AudioConfig {
    pub fn silent(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            amplitude: 0.0,
            ..Self::default()
        }
    }

    pub fn tone(duration_seconds: f64, sample_rate: u32) -> Self {
        Self {
            duration_seconds,
            sample_rate,
            ..Self::default()
        }
    }
}

/// Generate a 16-bit PCM WAV file in memory
pub fn generate_wav_bytes(config: &AudioConfig) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("Failed to create WAV writer");
        let total_frames = (config.duration_seconds * config.sample_rate as f64) as usize;

        for i in 0..total_frames {
            let t = i as f64 / config.sample_rate as f64;
            let value = config.amplitude * (2.0 * std::f64::consts::PI * config.frequency * t).sin();
            let sample = (value * i16::MAX as f64) as i16;
            for _ in 0..config.channels {
                writer.write_sample(sample).expect("Failed to write sample");
            }
        }

        writer.finalize().expect("Failed to finalize WAV");
    }
    cursor.into_inner()
}
