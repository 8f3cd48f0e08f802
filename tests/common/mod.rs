//! Shared fixtures for integration tests
//!
//! Everything is synthesized; no audio is checked in.

#![allow(dead_code)]

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use hitmix::engine::{write_wav, AudioBuffer, WavFormat};

pub const SAMPLE_RATE: u32 = 44100;

/// Deterministic noise in [-1, 1]
pub fn lcg_noise(len: usize, mut seed: u32) -> Vec<f32> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 23) as f32 - 1.0
        })
        .collect()
}

fn normalize_peak(data: &mut [f32], peak: f32) {
    let max = data.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        data.iter_mut().for_each(|s| *s *= peak / max);
    }
}

/// Stereo "dry vocal": 440 Hz with a second harmonic and light noise, 0.5 peak
pub fn vocal_fixture(duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let len = (duration_secs * sample_rate as f32) as usize;
    let noise = lcg_noise(len, 7);
    let mut data: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * PI * 440.0 * t).sin() + 0.3 * (2.0 * PI * 880.0 * t).sin() + 0.02 * noise[i]
        })
        .collect();
    normalize_peak(&mut data, 0.5);
    AudioBuffer::from_channels(vec![data.clone(), data], sample_rate).unwrap()
}

/// Stereo "instrumental": 110 Hz bass plus a decaying 60 Hz kick every 0.5 s, 0.6 peak
pub fn instrumental_fixture(duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let len = (duration_secs * sample_rate as f32) as usize;
    let mut data: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let kick = 0.5 * (2.0 * PI * 60.0 * t).sin() * (-10.0 * (t % 0.5)).exp();
            0.4 * (2.0 * PI * 110.0 * t).sin() + kick
        })
        .collect();
    normalize_peak(&mut data, 0.6);
    AudioBuffer::from_channels(vec![data.clone(), data], sample_rate).unwrap()
}

/// Write a fixture as 32-bit float so it reads back bit-exact
pub fn write_fixture(buffer: &AudioBuffer, dir: &Path, name: &str) -> PathBuf {
    write_wav(buffer, &dir.join(name), WavFormat::float32()).unwrap()
}

pub fn max_abs(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flatten()
        .fold(0.0_f32, |m, s| m.max(s.abs()))
}
