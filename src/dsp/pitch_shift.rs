//! Phase-vocoder pitch shifter
//!
//! Shifting by `c` cents stretches the signal in time by `2^(c/1200)` with a
//! phase vocoder and then resamples it back to the original duration. Output
//! length always equals input length.

use std::f32::consts::PI;

use rustfft::num_complex::Complex;

use crate::dsp::effect::Effect;
use crate::dsp::stft::{Spectrogram, Stft, DEFAULT_HOP, DEFAULT_N_FFT};
use crate::engine::resample::resample_linear;
use crate::engine::AudioBuffer;

/// Wrap a phase to [-π, π]
fn wrap_phase(phase: f32) -> f32 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

/// Resample a spectrogram in time by `rate` (>1 speeds up, <1 slows down)
fn phase_vocoder(frames: &Spectrogram, rate: f32, hop: usize, n_fft: usize) -> Spectrogram {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let n_bins = first.len();
    let zero = vec![Complex::new(0.0_f32, 0.0); n_bins];

    // expected phase advance per hop for each bin
    let phi_advance: Vec<f32> = (0..n_bins)
        .map(|k| 2.0 * PI * hop as f32 * k as f32 / n_fft as f32)
        .collect();
    let mut phase_acc: Vec<f32> = first.iter().map(|c| c.arg()).collect();

    let n_out = (frames.len() as f32 / rate).ceil() as usize;
    let mut out = Vec::with_capacity(n_out);

    for t in 0..n_out {
        let step = t as f32 * rate;
        let idx = step.floor() as usize;
        if idx >= frames.len() {
            break;
        }
        let alpha = step - idx as f32;
        let c0 = &frames[idx];
        let c1 = frames.get(idx + 1).unwrap_or(&zero);

        let frame = (0..n_bins)
            .map(|k| {
                let mag = (1.0 - alpha) * c0[k].norm() + alpha * c1[k].norm();
                Complex::from_polar(mag, phase_acc[k])
            })
            .collect();
        out.push(frame);

        for k in 0..n_bins {
            let dphase = wrap_phase(c1[k].arg() - c0[k].arg() - phi_advance[k]);
            phase_acc[k] += phi_advance[k] + dphase;
        }
    }

    out
}

/// Pitch shift by a number of cents, keeping duration
#[derive(Debug)]
pub struct PitchShifter {
    cents: f32,
    stft: Stft,
}

impl PitchShifter {
    pub fn new(cents: f32) -> Self {
        Self {
            cents,
            stft: Stft::new(DEFAULT_N_FFT, DEFAULT_HOP),
        }
    }

    pub fn cents(&self) -> f32 {
        self.cents
    }

    /// Shift one channel
    pub fn shift(&self, samples: &[f32]) -> Vec<f32> {
        if samples.is_empty() || self.cents == 0.0 {
            return samples.to_vec();
        }

        // rate < 1 stretches, so the resample back raises the pitch
        let rate = 2.0_f32.powf(-self.cents / 1200.0);
        let spectrogram = self.stft.forward(samples);
        let stretched = phase_vocoder(&spectrogram, rate, self.stft.hop(), self.stft.n_fft());
        let stretched_len = (samples.len() as f32 / rate).round() as usize;
        let y_stretch = self.stft.inverse(&stretched, stretched_len);

        let mut shifted = resample_linear(&y_stretch, rate as f64);
        shifted.resize(samples.len(), 0.0);
        shifted
    }
}

impl Effect for PitchShifter {
    fn effect_type(&self) -> &'static str {
        "pitch_shift"
    }

    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        AudioBuffer {
            samples: buffer.samples.iter().map(|ch| self.shift(ch)).collect(),
            sample_rate: buffer.sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::pitch::dominant_frequency;
    use crate::engine::generate_test_tone;

    #[test]
    fn test_length_preserved() {
        let tone = generate_test_tone(440.0, 0.5, 0.5, 44100);
        let out = PitchShifter::new(8.0).apply(&tone);
        assert_eq!(out.num_samples(), tone.num_samples());
        assert!(out.is_finite());
    }

    #[test]
    fn test_semitone_up() {
        let tone = generate_test_tone(440.0, 0.5, 1.0, 44100);
        let out = PitchShifter::new(100.0).apply(&tone);
        let f = dominant_frequency(out.channel(0), 44100).unwrap();
        // A4 up a semitone is 466.16 Hz
        assert!((f - 466.16).abs() < 3.0, "got {}", f);
    }

    #[test]
    fn test_zero_cents_is_identity() {
        let tone = generate_test_tone(440.0, 0.5, 0.1, 44100);
        assert_eq!(PitchShifter::new(0.0).apply(&tone), tone);
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-5 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-5);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-7);
    }
}
