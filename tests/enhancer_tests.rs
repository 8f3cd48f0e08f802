//! Vocal enhancer integration tests

mod common;

use std::fs;

use hitmix::config::{EnhancerConfig, EnhancerOverrides};
use hitmix::engine::{load_wav, AudioBuffer};
use hitmix::vocal::enhancer::DRY_RUN_SECONDS;
use hitmix::vocal::{ProcessingStep, VocalEnhancer, VocalMetadata};
use tempfile::tempdir;

use common::{vocal_fixture, write_fixture, SAMPLE_RATE};

// ------------------------------------------------------------------------
// In-memory
// ------------------------------------------------------------------------

#[test]
fn test_enhance_detects_a_and_keeps_shape() {
    let input = vocal_fixture(2.0, SAMPLE_RATE);
    let (out, meta) = VocalEnhancer::default().enhance(&input, None).unwrap();

    assert_eq!(out.num_samples(), input.num_samples());
    assert_eq!(out.num_channels(), 2);
    assert!(out.is_finite());
    assert!(common::max_abs(&out) <= 1.0);

    assert_eq!(meta.detected_key.as_deref(), Some("A"));
    let pitch = meta.median_pitch_hz.unwrap();
    assert!((pitch - 440.0).abs() < 15.0, "median pitch {}", pitch);
    assert!(meta.snr_db.is_some());
    assert!(meta.applied(ProcessingStep::SpectralDenoise));
    assert!(meta.applied(ProcessingStep::HighpassFilter));
    assert!(meta.applied(ProcessingStep::PitchDetection));
    assert!(meta.applied(ProcessingStep::VocalDoubler));
}

#[test]
fn test_enhance_resamples_48k_input() {
    let input = vocal_fixture(1.0, 48000);
    let (out, meta) = VocalEnhancer::default().enhance(&input, None).unwrap();
    assert_eq!(out.sample_rate, 44100);
    assert_eq!(out.num_samples(), 44100);
    assert_eq!(meta.detected_key.as_deref(), Some("A"));
}

#[test]
fn test_enhance_does_not_touch_input() {
    let input = vocal_fixture(0.5, SAMPLE_RATE);
    let copy = input.clone();
    VocalEnhancer::default().enhance(&input, None).unwrap();
    assert_eq!(input, copy);
}

#[test]
fn test_unimplemented_requests_degrade_gracefully() {
    let overrides = EnhancerOverrides {
        pitch_correction: Some(true),
        formant_shift: Some(-3.0),
        ..Default::default()
    };
    let enhancer = VocalEnhancer::new(EnhancerConfig::default()).unwrap();
    let (_, meta) = enhancer
        .enhance(&vocal_fixture(0.5, SAMPLE_RATE), Some(&overrides))
        .unwrap();
    assert!(!meta.applied(ProcessingStep::PitchCorrection));
    assert!(!meta.applied(ProcessingStep::FormantShift));
    assert_eq!(enhancer.config(), &EnhancerConfig::default());
}

#[test]
fn test_mono_input_stays_mono() {
    let stereo = vocal_fixture(0.5, SAMPLE_RATE);
    let mono = AudioBuffer::mono(stereo.channel(0).to_vec(), SAMPLE_RATE).unwrap();
    let (out, _) = VocalEnhancer::default().enhance(&mono, None).unwrap();
    assert_eq!(out.num_channels(), 1);
}

// ------------------------------------------------------------------------
// Files
// ------------------------------------------------------------------------

#[test]
fn test_enhance_file_writes_wav_and_sidecar() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&vocal_fixture(1.0, SAMPLE_RATE), dir.path(), "dry.wav");
    let output = dir.path().join("takes").join("enhanced.wav");

    let (path, meta) = VocalEnhancer::default()
        .enhance_file(&input, &output, None)
        .unwrap();
    assert_eq!(path, output);

    let written = load_wav(&output).unwrap();
    assert_eq!(written.sample_rate, 44100);
    assert_eq!(written.num_samples(), 44100);

    let sidecar = dir.path().join("takes").join("enhanced.json");
    let stored: VocalMetadata = serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(stored.detected_key, meta.detected_key);
    assert_eq!(stored.processing_applied, meta.processing_applied);
    for step in ProcessingStep::ALL {
        assert!(stored.processing_applied.contains_key(step.as_str()));
    }
}

#[test]
fn test_enhance_file_with_lighter_gate_and_doubler() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&vocal_fixture(2.0, SAMPLE_RATE), dir.path(), "dry.wav");
    let output = dir.path().join("enhanced.wav");

    let enhancer = VocalEnhancer::new(EnhancerConfig {
        denoise_db: 15.0,
        doubler_mix: 0.3,
        ..EnhancerConfig::default()
    })
    .unwrap();
    let (path, meta) = enhancer.enhance_file(&input, &output, None).unwrap();

    assert!(path.exists(), "missing output {}", path.display());
    let written = load_wav(&path).unwrap();
    assert_eq!(written.sample_rate, 44100);
    assert_eq!(meta.detected_key.as_deref(), Some("A"));
    assert!(meta.applied(ProcessingStep::SpectralDenoise));
    assert!(meta.applied(ProcessingStep::VocalDoubler));
}

#[test]
fn test_enhance_file_excerpt_keeps_first_seconds() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&vocal_fixture(6.0, SAMPLE_RATE), dir.path(), "long.wav");
    let output = dir.path().join("excerpt.wav");

    VocalEnhancer::default()
        .enhance_file_excerpt(&input, &output, None, Some(DRY_RUN_SECONDS))
        .unwrap();

    let written = load_wav(&output).unwrap();
    assert_eq!(
        written.num_samples(),
        5 * 44100,
        "excerpt has {} frames",
        written.num_samples()
    );

    // Shorter than the excerpt: nothing is cut
    let short = write_fixture(&vocal_fixture(1.0, SAMPLE_RATE), dir.path(), "short.wav");
    VocalEnhancer::default()
        .enhance_file_excerpt(&short, &output, None, Some(DRY_RUN_SECONDS))
        .unwrap();
    assert_eq!(load_wav(&output).unwrap().num_samples(), 44100);
}

#[test]
fn test_enhance_missing_file() {
    let dir = tempdir().unwrap();
    let err = VocalEnhancer::default()
        .enhance_file(
            &dir.path().join("absent.wav"),
            &dir.path().join("out.wav"),
            None,
        )
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    assert!(!dir.path().join("out.wav").exists());
}
