//! Short-time Fourier transform
//!
//! Centered analysis: the signal is zero-padded by `n_fft / 2` on both sides
//! so frame `t` is centered on sample `t * hop`. The inverse is a weighted
//! overlap-add normalized by the summed squared window, which reconstructs
//! the input exactly for an unmodified spectrogram.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Default analysis frame length
pub const DEFAULT_N_FFT: usize = 2048;

/// Default hop length (n_fft / 4)
pub const DEFAULT_HOP: usize = 512;

/// One channel's spectrogram: `frames[t][k]` for bins `k in 0..=n_fft/2`
pub type Spectrogram = Vec<Vec<Complex<f32>>>;

/// Periodic Hann window of length `n`
pub fn hann_periodic(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .map(|w| w as f32)
        .collect()
}

/// Symmetric Hann window of length `n`
pub fn hann_symmetric(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos())
        .map(|w| w as f32)
        .collect()
}

/// Forward/inverse STFT with cached FFT plans
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop", &self.hop)
            .finish()
    }
}

impl Stft {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n_fft,
            hop: hop.max(1),
            window: hann_periodic(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of positive-frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop
    }

    /// Analyze one channel
    pub fn forward(&self, signal: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0_f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let bins = self.num_bins();
        let mut scratch = vec![Complex::new(0.0, 0.0); self.n_fft];

        (0..self.num_frames(signal.len()))
            .map(|t| {
                let start = t * self.hop;
                for (i, slot) in scratch.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.forward.process(&mut scratch);
                scratch[..bins].to_vec()
            })
            .collect()
    }

    /// Resynthesize one channel to exactly `length` samples
    pub fn inverse(&self, frames: &Spectrogram, length: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; length];
        }

        let n = self.n_fft;
        let pad = n / 2;
        let total = n + self.hop * (frames.len() - 1);
        let mut output = vec![0.0_f64; total];
        let mut window_sum = vec![0.0_f64; total];
        let mut scratch = vec![Complex::new(0.0_f32, 0.0); n];
        let scale = 1.0 / n as f32;

        for (t, frame) in frames.iter().enumerate() {
            // rebuild the full spectrum from the Hermitian half
            for (k, slot) in scratch.iter_mut().enumerate() {
                *slot = if k < frame.len() {
                    frame[k]
                } else {
                    frame.get(n - k).map_or(Complex::new(0.0, 0.0), |c| c.conj())
                };
            }
            self.inverse.process(&mut scratch);

            let start = t * self.hop;
            for i in 0..n {
                let w = self.window[i] as f64;
                output[start + i] += (scratch[i].re * scale) as f64 * w;
                window_sum[start + i] += w * w;
            }
        }

        let mut result: Vec<f32> = output
            .iter()
            .zip(window_sum.iter())
            .skip(pad)
            .take(length)
            .map(|(&y, &w)| if w > f64::MIN_POSITIVE { (y / w) as f32 } else { y as f32 })
            .collect();
        result.resize(length, 0.0);
        result
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new(DEFAULT_N_FFT, DEFAULT_HOP)
    }
}
