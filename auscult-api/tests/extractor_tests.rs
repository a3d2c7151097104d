//! Feature extraction integration tests
//!
//! Every recording, whatever its rate, channel count or length, must come
//! out as the same fixed-shape MFCC matrix.

mod helpers;

use auscult_api::audio::AudioBuffer;
use auscult_api::features::{AudioFeatureExtractor, FeatureParams};
use auscult_api::inference::ModelInputTensor;

use helpers::{generate_wav_bytes, AudioConfig};

fn extractor() -> AudioFeatureExtractor {
    AudioFeatureExtractor::new(FeatureParams::default()).unwrap()
}

fn wav_buffer(config: &AudioConfig) -> AudioBuffer {
    AudioBuffer::new(generate_wav_bytes(config), Some("clip.wav".to_string()))
}

#[test]
fn test_window_is_fixed_across_rates_and_lengths() {
    let extractor = extractor();

    for &rate in &[8000u32, 16000, 22050, 44100, 48000] {
        for &seconds in &[0.5f64, 5.0, 8.0] {
            let waveform = extractor
                .normalize(&wav_buffer(&AudioConfig::tone(seconds, rate)))
                .unwrap_or_else(|e| panic!("{} Hz, {} s: {}", rate, seconds, e));

            assert_eq!(waveform.sample_rate(), 22050);
            assert_eq!(waveform.len(), 110_250, "{} Hz, {} s", rate, seconds);
        }
    }
}

#[test]
fn test_normalized_peak_is_unity() {
    let extractor = extractor();
    let waveform = extractor
        .normalize(&wav_buffer(&AudioConfig::tone(2.0, 44100)))
        .unwrap();

    let peak = waveform.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - 1.0).abs() < 1e-4, "peak {}", peak);
}

#[test]
fn test_padding_is_silence() {
    let extractor = extractor();
    let waveform = extractor
        .normalize(&wav_buffer(&AudioConfig::tone(1.0, 22050)))
        .unwrap();

    assert!(waveform.samples()[30_000..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_stereo_matches_mono() {
    let extractor = extractor();
    let mono = AudioConfig::tone(2.0, 22050);
    let stereo = AudioConfig {
        channels: 2,
        ..mono.clone()
    };

    let mono_features = extractor.extract(&wav_buffer(&mono)).unwrap();
    let stereo_features = extractor.extract(&wav_buffer(&stereo)).unwrap();

    assert_eq!(mono_features.shape(), stereo_features.shape());
    for (a, b) in mono_features.as_slice().iter().zip(stereo_features.as_slice()) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn test_features_reshape_to_model_input() {
    let extractor = extractor();
    let features = extractor
        .extract(&wav_buffer(&AudioConfig::tone(3.0, 16000)))
        .unwrap();
    assert_eq!(features.shape(), (13, 216));
    assert!(features.as_slice().iter().all(|v| v.is_finite()));

    let tensor = ModelInputTensor::from_features(features.clone());
    assert_eq!(tensor.shape(), [1, 13, 216, 1]);
    assert_eq!(tensor.get([0, 4, 100, 0]), features.get(4, 100));
}

#[test]
fn test_extraction_is_deterministic() {
    let extractor = extractor();
    let buffer = wav_buffer(&AudioConfig::tone(4.0, 48000));

    let first = extractor.extract(&buffer).unwrap();
    let second = extractor.extract(&buffer).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_upload_is_decode_error() {
    let extractor = extractor();
    let buffer = AudioBuffer::new(Vec::new(), Some("empty.wav".to_string()));

    assert!(extractor.extract(&buffer).is_err());
}
