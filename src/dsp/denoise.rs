//! Spectral noise gate
//!
//! Estimates a global noise floor as the 10th percentile of all STFT
//! magnitudes, then zeroes every bin whose magnitude does not exceed
//! `noise_floor / 10^(-denoise_db / 20)`. Phase is kept. Numerical trouble
//! never raises: the outcome carries the untouched input and no SNR.

use log::{debug, warn};
use rustfft::num_complex::Complex;

use crate::dsp::stft::{Stft, DEFAULT_HOP, DEFAULT_N_FFT};
use crate::engine::AudioBuffer;

/// Default gate depth in dB
pub const DEFAULT_DENOISE_DB: f32 = 18.0;

/// Percentile of all magnitudes taken as the noise floor
pub const NOISE_FLOOR_PERCENTILE: f32 = 10.0;

/// Why the gate fell back to the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenoiseFailure {
    EmptySignal,
    NonFiniteInput,
    NonFiniteOutput,
    DegenerateSnr,
}

impl std::fmt::Display for DenoiseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DenoiseFailure::EmptySignal => "signal has no samples",
            DenoiseFailure::NonFiniteInput => "input contains NaN or infinite samples",
            DenoiseFailure::NonFiniteOutput => "resynthesis produced NaN or infinite samples",
            DenoiseFailure::DegenerateSnr => "SNR estimate is not finite",
        };
        f.write_str(msg)
    }
}

/// Result of one gating pass
#[derive(Debug, Clone)]
pub struct DenoiseOutcome {
    /// Gated audio, or a copy of the input on failure
    pub buffer: AudioBuffer,
    /// Estimated SNR in dB, absent on failure
    pub snr_db: Option<f32>,
    /// Fraction of STFT bins zeroed by the gate
    pub gated_fraction: f32,
    /// Set when the gate fell back to the input
    pub failure: Option<DenoiseFailure>,
}

impl DenoiseOutcome {
    fn fallback(input: &AudioBuffer, failure: DenoiseFailure) -> Self {
        warn!("Spectral denoising failed: {}, returning original audio", failure);
        Self {
            buffer: input.clone(),
            snr_db: None,
            gated_fraction: 0.0,
            failure: Some(failure),
        }
    }

    /// True when the gate produced its own output
    pub fn applied(&self) -> bool {
        self.failure.is_none()
    }
}

/// Linear-interpolated percentile (`p` in 0..=100) of unsorted values
pub fn percentile(values: &[f32], p: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) as f64 / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// SNR estimate from original and gated magnitudes
pub fn estimate_snr_db(original: &[f32], gated: &[f32]) -> f32 {
    let n = original.len().max(1) as f64;
    let signal_power: f64 = gated.iter().map(|&g| (g as f64).powi(2)).sum::<f64>() / n;
    let noise_power: f64 = original
        .iter()
        .zip(gated.iter())
        .map(|(&m, &g)| ((m - g) as f64).powi(2))
        .sum::<f64>()
        / n
        + 1e-10;
    (10.0 * (signal_power / noise_power).log10()) as f32
}

/// Global spectral gate
#[derive(Debug)]
pub struct SpectralGate {
    denoise_db: f32,
    stft: Stft,
}

impl SpectralGate {
    pub fn new(denoise_db: f32) -> Self {
        Self::with_frame(denoise_db, DEFAULT_N_FFT, DEFAULT_HOP)
    }

    pub fn with_frame(denoise_db: f32, n_fft: usize, hop: usize) -> Self {
        Self {
            denoise_db,
            stft: Stft::new(n_fft, hop),
        }
    }

    pub fn denoise_db(&self) -> f32 {
        self.denoise_db
    }

    /// Magnitude threshold for a given noise floor
    ///
    /// With `denoise_db = 0` the gate equals the noise floor itself.
    pub fn gate_threshold(&self, noise_floor: f32) -> f32 {
        let threshold_factor = 10.0_f32.powf(-self.denoise_db / 20.0);
        noise_floor / threshold_factor
    }

    /// Gate every channel against one shared noise floor
    pub fn process(&self, input: &AudioBuffer) -> DenoiseOutcome {
        if input.is_empty() || input.num_channels() == 0 {
            return DenoiseOutcome::fallback(input, DenoiseFailure::EmptySignal);
        }
        if !input.is_finite() {
            return DenoiseOutcome::fallback(input, DenoiseFailure::NonFiniteInput);
        }

        let spectra: Vec<_> = input.samples.iter().map(|ch| self.stft.forward(ch)).collect();
        let magnitudes: Vec<f32> = spectra
            .iter()
            .flat_map(|frames| frames.iter().flat_map(|f| f.iter().map(|c| c.norm())))
            .collect();

        let Some(noise_floor) = percentile(&magnitudes, NOISE_FLOOR_PERCENTILE) else {
            return DenoiseOutcome::fallback(input, DenoiseFailure::EmptySignal);
        };
        let gate = self.gate_threshold(noise_floor);

        let gated_mags: Vec<f32> = magnitudes
            .iter()
            .map(|&m| if m > gate { m } else { 0.0 })
            .collect();
        let zeroed = gated_mags.iter().filter(|&&m| m == 0.0).count();
        let gated_fraction = zeroed as f32 / magnitudes.len() as f32;

        let snr_db = estimate_snr_db(&magnitudes, &gated_mags);
        if !snr_db.is_finite() {
            return DenoiseOutcome::fallback(input, DenoiseFailure::DegenerateSnr);
        }

        let len = input.num_samples();
        let samples: Vec<Vec<f32>> = spectra
            .into_iter()
            .map(|frames| {
                let masked = frames
                    .into_iter()
                    .map(|frame| {
                        frame
                            .into_iter()
                            .map(|c| if c.norm() > gate { c } else { Complex::new(0.0, 0.0) })
                            .collect()
                    })
                    .collect();
                self.stft.inverse(&masked, len)
            })
            .collect();

        let buffer = AudioBuffer {
            samples,
            sample_rate: input.sample_rate,
        };
        if !buffer.is_finite() {
            return DenoiseOutcome::fallback(input, DenoiseFailure::NonFiniteOutput);
        }

        debug!(
            "Spectral gate: floor {:.3e}, gate {:.3e}, {:.1}% bins zeroed, SNR {:.1} dB",
            noise_floor,
            gate,
            gated_fraction * 100.0,
            snr_db
        );

        DenoiseOutcome {
            buffer,
            snr_db: Some(snr_db),
            gated_fraction,
            failure: None,
        }
    }
}

impl Default for SpectralGate {
    fn default() -> Self {
        Self::new(DEFAULT_DENOISE_DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    fn noisy_tone() -> AudioBuffer {
        let tone = generate_test_tone(440.0, 0.5, 1.0, 44100);
        // deterministic LCG noise
        let mut seed: u32 = 12345;
        tone.map_samples(move |s| {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            let noise = (seed >> 8) as f32 / (1u32 << 24) as f32 - 0.5;
            s + noise * 0.002
        })
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert!((percentile(&values, 10.0).unwrap() - 1.4).abs() < 1e-6);
        assert_eq!(percentile(&[], 10.0), None);
    }

    #[test]
    fn test_gate_threshold_zero_db_equals_floor() {
        let gate = SpectralGate::new(0.0);
        assert_eq!(gate.gate_threshold(0.02), 0.02);
    }

    #[test]
    fn test_gate_threshold_scales_up() {
        let gate = SpectralGate::new(20.0);
        assert!((gate.gate_threshold(0.01) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_db_gates_at_most_tenth_of_bins() {
        let outcome = SpectralGate::new(0.0).process(&noisy_tone());
        assert!(outcome.applied());
        assert!(
            outcome.gated_fraction <= 0.1 + 1e-3,
            "gated fraction {}",
            outcome.gated_fraction
        );
    }

    #[test]
    fn test_length_and_shape_preserved() {
        let input = noisy_tone();
        let outcome = SpectralGate::default().process(&input);
        assert_eq!(outcome.buffer.num_samples(), input.num_samples());
        assert_eq!(outcome.buffer.num_channels(), input.num_channels());
        assert!(outcome.snr_db.unwrap().is_finite());
    }

    #[test]
    fn test_silence_falls_back() {
        let silent = AudioBuffer::silence(2, 4096, 44100);
        let outcome = SpectralGate::default().process(&silent);
        assert_eq!(outcome.failure, Some(DenoiseFailure::DegenerateSnr));
        assert!(outcome.snr_db.is_none());
        assert_eq!(outcome.buffer, silent);
    }

    #[test]
    fn test_non_finite_input_falls_back() {
        let mut data = vec![0.1; 4096];
        data[10] = f32::NAN;
        let input = AudioBuffer::mono(data, 44100).unwrap();
        let outcome = SpectralGate::default().process(&input);
        assert_eq!(outcome.failure, Some(DenoiseFailure::NonFiniteInput));
        assert!(outcome.snr_db.is_none());
        assert!(outcome.buffer.channel(0)[10].is_nan());
    }

    #[test]
    fn test_empty_input_falls_back() {
        let input = AudioBuffer::silence(1, 0, 44100);
        let outcome = SpectralGate::default().process(&input);
        assert_eq!(outcome.failure, Some(DenoiseFailure::EmptySignal));
    }
}
