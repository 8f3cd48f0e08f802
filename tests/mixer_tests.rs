//! Stem mixer integration tests

mod common;

use approx::assert_relative_eq;
use hitmix::config::MixerConfig;
use hitmix::dsp::integrated_loudness;
use hitmix::engine::{calculate_rms, load_wav, AudioBuffer};
use hitmix::mixer::{MixOptions, StemMixer};
use hitmix::vocal::VocalEnhancer;
use tempfile::tempdir;
use test_case::test_case;

use common::{instrumental_fixture, max_abs, vocal_fixture, write_fixture, SAMPLE_RATE};

fn dry_options() -> MixOptions {
    MixOptions {
        add_vocal_echo: false,
        ..MixOptions::default()
    }
}

// ------------------------------------------------------------------------
// Gain staging
// ------------------------------------------------------------------------

#[test_case(-3.0)]
#[test_case(0.0)]
#[test_case(-12.0)]
fn test_gain_is_exact(gain_db: f32) {
    let vocal = vocal_fixture(0.5, SAMPLE_RATE);
    let silent = AudioBuffer::silence(2, vocal.num_samples(), SAMPLE_RATE);
    let options = MixOptions {
        instrumental_gain_db: gain_db,
        vocal_gain_db: 0.0,
        add_vocal_echo: false,
    };
    let mixed = StemMixer::default().mix(&vocal, &silent, &options).unwrap();
    let factor = 10.0_f32.powf(gain_db / 20.0);
    for (out, inp) in mixed.channel(0).iter().zip(vocal.channel(0)) {
        assert_relative_eq!(*out, inp * factor, epsilon = 1e-6);
    }
}

#[test]
fn test_mix_length_is_longest_stem() {
    let inst = instrumental_fixture(2.0, SAMPLE_RATE);
    let vocal = vocal_fixture(1.0, SAMPLE_RATE);
    let mixed = StemMixer::default()
        .mix(&inst, &vocal, &MixOptions::default())
        .unwrap();
    assert_eq!(mixed.num_samples(), inst.num_samples());
    assert_eq!(mixed.num_channels(), 2);
}

#[test]
fn test_mix_resamples_stems() {
    let inst = instrumental_fixture(1.0, 48000);
    let vocal = vocal_fixture(1.0, 22050);
    let mixed = StemMixer::default().mix(&inst, &vocal, &dry_options()).unwrap();
    assert_eq!(mixed.sample_rate, 44100);
    assert_eq!(mixed.num_samples(), 44100);
}

#[test]
fn test_mix_always_clipped() {
    let loud = vocal_fixture(1.0, SAMPLE_RATE).apply_gain(12.0);
    let options = MixOptions {
        instrumental_gain_db: 6.0,
        vocal_gain_db: 6.0,
        add_vocal_echo: true,
    };
    let mixed = StemMixer::default().mix(&loud, &loud, &options).unwrap();
    assert!(max_abs(&mixed) <= 1.0);
}

#[test]
fn test_echo_changes_tail_only_after_delay() {
    let vocal = vocal_fixture(1.0, SAMPLE_RATE);
    let silent = AudioBuffer::silence(2, vocal.num_samples(), SAMPLE_RATE);
    let mixer = StemMixer::default();
    let dry = mixer.mix(&silent, &vocal, &dry_options()).unwrap();
    let wet = mixer.mix(&silent, &vocal, &MixOptions::default()).unwrap();

    let delay = (0.25 * SAMPLE_RATE as f32) as usize;
    assert_eq!(&dry.channel(0)[..delay], &wet.channel(0)[..delay]);
    assert_ne!(&dry.channel(0)[delay..], &wet.channel(0)[delay..]);
}

// ------------------------------------------------------------------------
// Loudness
// ------------------------------------------------------------------------

#[test_case(-9.5)]
#[test_case(-14.0)]
#[test_case(-23.0)]
fn test_normalize_lands_on_target(target: f32) {
    let mixer = StemMixer::default();
    let mix = mixer
        .mix(
            &instrumental_fixture(2.0, SAMPLE_RATE),
            &vocal_fixture(2.0, SAMPLE_RATE),
            &MixOptions::default(),
        )
        .unwrap();
    let mastered = mixer.normalize_lufs(&mix, target).unwrap();
    let lufs = integrated_loudness(&mastered).unwrap().unwrap();
    assert!(
        (lufs - target as f64).abs() < 0.5,
        "Expected ~{:.1} LUFS, got {:.2} LUFS",
        target,
        lufs
    );
    assert!(max_abs(&mastered) <= 1.0);
}

#[test]
fn test_normalize_is_idempotent() {
    let mixer = StemMixer::default();
    let once = mixer
        .normalize_lufs(&vocal_fixture(2.0, SAMPLE_RATE), -16.0)
        .unwrap();
    let twice = mixer.normalize_lufs(&once, -16.0).unwrap();
    let a = integrated_loudness(&once).unwrap().unwrap();
    let b = integrated_loudness(&twice).unwrap().unwrap();
    assert!((a - b).abs() < 0.5);
}

#[test]
fn test_normalize_too_short_is_passthrough() {
    let blip = vocal_fixture(0.1, SAMPLE_RATE);
    let out = StemMixer::default().normalize_lufs(&blip, -9.5).unwrap();
    assert_eq!(out, blip);
}

// ------------------------------------------------------------------------
// Blending
// ------------------------------------------------------------------------

#[test]
fn test_blend_extremes() {
    let mixer = StemMixer::default();
    let a = vocal_fixture(0.5, SAMPLE_RATE);
    let b = a.apply_gain(-6.0);

    let only_a = mixer.blend_vocals(&a, &b, 0.0).unwrap();
    let only_b = mixer.blend_vocals(&a, &b, 1.0).unwrap();
    for i in (0..a.num_samples()).step_by(97) {
        assert_relative_eq!(only_a.channel(0)[i], a.channel(0)[i], epsilon = 1e-6);
        assert_relative_eq!(only_b.channel(1)[i], b.channel(1)[i], epsilon = 1e-6);
    }
}

#[test]
fn test_blend_of_enhanced_variants_is_between() {
    let source = vocal_fixture(1.0, SAMPLE_RATE);
    let thin = VocalEnhancer::new(hitmix::config::EnhancerConfig {
        doubler_mix: 0.0,
        ..Default::default()
    })
    .unwrap();
    let thick = VocalEnhancer::new(hitmix::config::EnhancerConfig {
        doubler_mix: 0.5,
        ..Default::default()
    })
    .unwrap();
    let (a, _) = thin.enhance(&source, None).unwrap();
    let (b, _) = thick.enhance(&source, None).unwrap();

    let blended = StemMixer::default().blend_vocals(&a, &b, 0.5).unwrap();
    let (ra, rb, rm) = (calculate_rms(&a), calculate_rms(&b), calculate_rms(&blended));
    assert!(rm > 0.0 && rm < 1.0);
    assert!(rm <= ra.max(rb) + 1e-4, "blend rms {} above both takes", rm);
    assert!(rm >= ra.min(rb) - 1e-4, "blend rms {} below both takes", rm);
}

// ------------------------------------------------------------------------
// Full chain and files
// ------------------------------------------------------------------------

#[test]
fn test_full_chain_files() {
    let dir = tempdir().unwrap();
    let inst = write_fixture(&instrumental_fixture(2.0, SAMPLE_RATE), dir.path(), "inst.wav");
    let vocal = write_fixture(&vocal_fixture(2.0, SAMPLE_RATE), dir.path(), "vox.wav");
    let enhanced = dir.path().join("enhanced.wav");
    VocalEnhancer::default()
        .enhance_file(&vocal, &enhanced, None)
        .unwrap();

    let mixer = StemMixer::new(MixerConfig::default()).unwrap();
    let mix_path = dir.path().join("mix.wav");
    mixer
        .mix_files(&inst, &enhanced, &mix_path, &mixer.default_options())
        .unwrap();
    let master_path = dir.path().join("master.wav");
    mixer
        .normalize_lufs_file(&mix_path, &master_path, -9.5)
        .unwrap();

    let master = load_wav(&master_path).unwrap();
    let rms = calculate_rms(&master);
    assert!(rms > 0.0 && rms < 1.0, "rms {}", rms);
    assert!(max_abs(&master) <= 1.0);
    let lufs = integrated_loudness(&master).unwrap().unwrap();
    assert!((lufs + 9.5).abs() < 0.5, "got {:.2} LUFS", lufs);
}

#[test]
fn test_mix_files_missing_input_writes_nothing() {
    let dir = tempdir().unwrap();
    let inst = write_fixture(&instrumental_fixture(0.5, SAMPLE_RATE), dir.path(), "inst.wav");
    let out = dir.path().join("mix.wav");
    let err = StemMixer::default()
        .mix_files(&inst, &dir.path().join("missing.wav"), &out, &MixOptions::default())
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    assert!(!out.exists());
}

#[test]
fn test_blend_vocal_files_rejects_bad_ratio() {
    let dir = tempdir().unwrap();
    let a = write_fixture(&vocal_fixture(0.5, SAMPLE_RATE), dir.path(), "a.wav");
    let out = dir.path().join("blend.wav");
    let err = StemMixer::default()
        .blend_vocal_files(&a, &a, &out, 1.5)
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
    assert!(!out.exists());
}
