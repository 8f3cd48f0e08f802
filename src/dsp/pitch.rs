//! Pitch and key estimation
//!
//! Two independent estimates are fused into one median pitch:
//! - a probabilistic YIN tracker (beta-distributed thresholds, Boltzmann
//!   trough prior, two-state voicing HMM decoded with Viterbi) whose voiced
//!   frames give a median f0
//! - the peak bin of a Hann-windowed FFT over the whole signal
//!
//! The YIN median is robust to vibrato but can lock onto subharmonics; the
//! FFT peak is octave-stable on sustained notes. When they disagree by more
//! than roughly an octave the FFT wins, otherwise they are averaged.

use log::{debug, info, warn};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::dsp::stft::hann_symmetric;
use crate::engine::AudioBuffer;

// ============================================================================
// Constants
// ============================================================================

/// Lowest tracked pitch (C2)
pub const PITCH_FMIN_HZ: f32 = 65.406_39;

/// Highest tracked pitch (C6)
pub const PITCH_FMAX_HZ: f32 = 1046.502_3;

/// Analysis frame length in samples
pub const PITCH_FRAME_LENGTH: usize = 2048;

/// Hop between analysis frames
pub const PITCH_HOP: usize = 512;

const N_THRESHOLDS: usize = 100;
const BETA_A: i32 = 2;
const BETA_B: i32 = 18;
const BOLTZMANN_PARAMETER: f64 = 2.0;
const NO_TROUGH_PROB: f64 = 0.01;
const SWITCH_PROB: f64 = 0.01;

/// Fusion bounds on dominant/tracker ratio
const FUSION_RATIO_HIGH: f32 = 1.8;
const FUSION_RATIO_LOW: f32 = 0.55;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// ============================================================================
// Results
// ============================================================================

/// Frame-wise tracker output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    /// Fundamental per frame, `None` for unvoiced frames
    pub f0: Vec<Option<f32>>,
    /// Probability that each frame is voiced
    pub voiced_probability: Vec<f32>,
}

impl PitchTrack {
    /// Median f0 of voiced frames
    pub fn voiced_median(&self) -> Option<f32> {
        median(self.f0.iter().flatten().copied().collect())
    }

    pub fn voiced_frames(&self) -> usize {
        self.f0.iter().filter(|f| f.is_some()).count()
    }
}

/// Everything the enhancer learns about pitch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchAnalysis {
    /// Note name without octave, e.g. "A" or "C#"
    pub detected_key: Option<String>,
    /// Fused median pitch
    pub median_pitch_hz: Option<f32>,
    pub tracker_median_hz: Option<f32>,
    pub dominant_hz: Option<f32>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Median with numpy semantics (mean of the middle pair for even counts)
pub fn median(mut values: Vec<f32>) -> Option<f32> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Nearest equal-tempered note name (sharps, octave stripped)
pub fn note_name(frequency_hz: f32) -> Option<String> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let midi = 69.0 + 12.0 * (frequency_hz as f64 / 440.0).log2();
    let index = (midi.round() as i64).rem_euclid(12) as usize;
    Some(NOTE_NAMES[index].to_string())
}

/// Combine the tracker median with the FFT peak
pub fn fuse_estimates(tracker_hz: Option<f32>, dominant_hz: Option<f32>) -> Option<f32> {
    match (tracker_hz, dominant_hz) {
        (None, None) => None,
        (Some(t), None) => Some(t),
        (None, Some(d)) => Some(d),
        (Some(t), Some(d)) => {
            let ratio = d / t.max(1e-6);
            if ratio > FUSION_RATIO_HIGH || ratio < FUSION_RATIO_LOW {
                Some(d)
            } else {
                Some((t + d) / 2.0)
            }
        }
    }
}

/// Frequency of the strongest bin of a Hann-windowed FFT over `mono`
///
/// Returns `None` when the peak is the DC bin (silence, pure offset).
pub fn dominant_frequency(mono: &[f32], sample_rate: u32) -> Option<f32> {
    let n = mono.len();
    if n < 2 || sample_rate == 0 {
        return None;
    }

    let window = hann_symmetric(n);
    let mut spectrum: Vec<Complex<f32>> = mono
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| Complex::new(s * w, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let (idx, peak) = spectrum[..=n / 2]
        .iter()
        .map(|c| c.norm())
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, m)| {
            if m > best.1 {
                (i, m)
            } else {
                best
            }
        });

    if idx == 0 || !peak.is_finite() {
        return None;
    }
    Some(idx as f32 * sample_rate as f32 / n as f32)
}

/// Regularized incomplete beta I_x(a, b) for positive integer a, b
fn beta_cdf(x: f64, a: i32, b: i32) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let n = a + b - 1;
    let mut total = 0.0;
    let mut binom = 1.0_f64;
    for j in 0..=n {
        if j > 0 {
            binom *= (n - j + 1) as f64 / j as f64;
        }
        if j >= a {
            total += binom * x.powi(j) * (1.0 - x).powi(n - j);
        }
    }
    total.clamp(0.0, 1.0)
}

fn boltzmann_pmf(k: usize, lambda: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (1.0 - (-lambda).exp()) * (-lambda * k as f64).exp() / (1.0 - (-lambda * n as f64).exp())
}

/// Sub-sample offsets of local extrema by parabolic interpolation
fn parabolic_shifts(x: &[f64]) -> Vec<f64> {
    let mut shifts = vec![0.0; x.len()];
    for i in 1..x.len().saturating_sub(1) {
        let a = x[i + 1] + x[i - 1] - 2.0 * x[i];
        let b = (x[i + 1] - x[i - 1]) / 2.0;
        if b.abs() < a.abs() {
            shifts[i] = -b / a;
        }
    }
    shifts
}

fn trough_indices(x: &[f64]) -> Vec<usize> {
    let m = x.len();
    if m < 2 {
        return Vec::new();
    }
    (0..m)
        .filter(|&i| {
            if i == 0 {
                x[0] < x[1]
            } else if i == m - 1 {
                x[i] < x[i - 1]
            } else {
                x[i] < x[i - 1] && x[i] <= x[i + 1]
            }
        })
        .collect()
}

// ============================================================================
// Pitch Tracker
// ============================================================================

/// Probabilistic YIN f0 tracker
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTracker {
    sample_rate: u32,
    frame_length: usize,
    hop: usize,
    fmin: f32,
    fmax: f32,
}

impl PitchTracker {
    /// Tracker over C2..C6 with 2048-sample frames and 512-sample hop
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame_length: PITCH_FRAME_LENGTH,
            hop: PITCH_HOP,
            fmin: PITCH_FMIN_HZ,
            fmax: PITCH_FMAX_HZ,
        }
    }

    pub fn with_range(mut self, fmin: f32, fmax: f32) -> Self {
        self.fmin = fmin;
        self.fmax = fmax;
        self
    }

    /// Threshold distribution: mass of Beta(2, 18) between consecutive thresholds
    fn beta_probs() -> Vec<f64> {
        let thresholds: Vec<f64> = (0..=N_THRESHOLDS)
            .map(|i| i as f64 / N_THRESHOLDS as f64)
            .collect();
        thresholds
            .windows(2)
            .map(|w| beta_cdf(w[1], BETA_A, BETA_B) - beta_cdf(w[0], BETA_A, BETA_B))
            .collect()
    }

    /// Cumulative mean normalized difference for lags `0..=max_period`
    fn cmnd(frame: &[f32], win: usize, max_period: usize) -> Vec<f64> {
        let mut out = vec![1.0_f64; max_period + 1];
        let mut running = 0.0_f64;
        for tau in 1..=max_period {
            let diff: f64 = frame[..win]
                .iter()
                .zip(&frame[tau..tau + win])
                .map(|(&a, &b)| {
                    let d = (a - b) as f64;
                    d * d
                })
                .sum();
            running += diff;
            out[tau] = diff * tau as f64 / (running + f64::MIN_POSITIVE);
        }
        out
    }

    /// Probability mass assigned to each trough of one frame
    fn trough_probabilities(yin: &[f64], beta_probs: &[f64]) -> Vec<(usize, f64)> {
        let troughs = trough_indices(yin);
        if troughs.is_empty() {
            return Vec::new();
        }

        let heights: Vec<f64> = troughs.iter().map(|&i| yin[i]).collect();
        let mut probs = vec![0.0_f64; troughs.len()];

        for (t, beta) in beta_probs.iter().enumerate() {
            let threshold = (t + 1) as f64 / N_THRESHOLDS as f64;
            let n_below = heights.iter().filter(|&&h| h < threshold).count();
            let mut position = 0;
            for (j, &h) in heights.iter().enumerate() {
                if h < threshold {
                    probs[j] += boltzmann_pmf(position, BOLTZMANN_PARAMETER, n_below) * beta;
                    position += 1;
                }
            }
        }

        let global_min = heights
            .iter()
            .enumerate()
            .fold(0, |best, (j, &h)| if h < heights[best] { j } else { best });
        let thresholds_above_min = (0..N_THRESHOLDS)
            .filter(|&t| heights[global_min] >= (t + 1) as f64 / N_THRESHOLDS as f64)
            .count();
        probs[global_min] += NO_TROUGH_PROB * beta_probs[..thresholds_above_min].iter().sum::<f64>();

        troughs.into_iter().zip(probs).collect()
    }

    /// Two-state (unvoiced, voiced) Viterbi over per-frame voicing probabilities
    fn decode_voicing(voiced_probability: &[f32]) -> Vec<bool> {
        let n = voiced_probability.len();
        if n == 0 {
            return Vec::new();
        }
        let floor = 1e-12_f64;
        let stay = (1.0 - SWITCH_PROB).ln();
        let switch = SWITCH_PROB.ln();
        let emit = |p: f32, voiced: bool| -> f64 {
            let p = p.clamp(0.0, 1.0) as f64;
            if voiced {
                p.max(floor).ln()
            } else {
                (1.0 - p).max(floor).ln()
            }
        };

        let mut score = [
            0.5_f64.ln() + emit(voiced_probability[0], false),
            0.5_f64.ln() + emit(voiced_probability[0], true),
        ];
        let mut back: Vec<[usize; 2]> = Vec::with_capacity(n);
        back.push([0, 1]);

        for &p in &voiced_probability[1..] {
            let mut next = [0.0; 2];
            let mut ptr = [0usize; 2];
            for state in 0..2 {
                let from_same = score[state] + stay;
                let from_other = score[1 - state] + switch;
                if from_same >= from_other {
                    next[state] = from_same;
                    ptr[state] = state;
                } else {
                    next[state] = from_other;
                    ptr[state] = 1 - state;
                }
                next[state] += emit(p, state == 1);
            }
            score = next;
            back.push(ptr);
        }

        let mut state = if score[1] > score[0] { 1 } else { 0 };
        let mut path = vec![false; n];
        for t in (0..n).rev() {
            path[t] = state == 1;
            state = back[t][state];
        }
        path
    }

    /// Track f0 over a mono signal
    pub fn track(&self, mono: &[f32]) -> PitchTrack {
        let sr = self.sample_rate as f64;
        let win = self.frame_length / 2;
        if mono.is_empty() || self.sample_rate == 0 || self.fmax <= self.fmin {
            return PitchTrack::default();
        }

        let min_period = ((sr / self.fmax as f64).floor() as usize).max(1);
        let max_period = ((sr / self.fmin as f64).ceil() as usize).min(self.frame_length - win - 1);
        if min_period + 2 > max_period {
            warn!(
                "Pitch range {}-{} Hz is unusable at {} Hz",
                self.fmin, self.fmax, self.sample_rate
            );
            return PitchTrack::default();
        }

        let pad = self.frame_length / 2;
        let mut padded = vec![0.0_f32; mono.len() + 2 * pad];
        padded[pad..pad + mono.len()].copy_from_slice(mono);

        let beta_probs = Self::beta_probs();
        let n_frames = 1 + mono.len() / self.hop;
        let mut candidates = Vec::with_capacity(n_frames);
        let mut voiced_probability = Vec::with_capacity(n_frames);

        for t in 0..n_frames {
            let start = t * self.hop;
            let frame = &padded[start..start + self.frame_length];
            let cmnd = Self::cmnd(frame, win, max_period);
            let yin = &cmnd[min_period..=max_period];
            let shifts = parabolic_shifts(yin);
            let probs = Self::trough_probabilities(yin, &beta_probs);

            let total: f64 = probs.iter().map(|(_, p)| p).sum();
            voiced_probability.push(total.clamp(0.0, 1.0) as f32);

            let best = probs
                .iter()
                .copied()
                .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                    Some((_, bp)) if bp >= p => best,
                    _ => Some((i, p)),
                });
            let f0 = best.and_then(|(i, _)| {
                let period = (min_period + i) as f64 + shifts[i];
                let f = (sr / period) as f32;
                (f.is_finite() && period > 0.0).then_some(f)
            });
            candidates.push(f0);
        }

        let voiced = Self::decode_voicing(&voiced_probability);
        let f0 = candidates
            .into_iter()
            .zip(voiced)
            .map(|(f, v)| if v { f } else { None })
            .collect();

        PitchTrack {
            f0,
            voiced_probability,
        }
    }
}

// ============================================================================
// Analysis entry point
// ============================================================================

/// Estimate median pitch and key of a (possibly multichannel) buffer
pub fn analyze(buffer: &AudioBuffer) -> PitchAnalysis {
    if buffer.is_empty() || !buffer.is_finite() {
        warn!("Pitch detection skipped: buffer is empty or contains non-finite samples");
        return PitchAnalysis::default();
    }

    let mono = buffer.to_mono();
    let samples = mono.channel(0);

    let track = PitchTracker::new(buffer.sample_rate).track(samples);
    let tracker_median_hz = track.voiced_median();
    let dominant_hz = dominant_frequency(samples, buffer.sample_rate);
    debug!(
        "Pitch tracker: {}/{} voiced frames, median {:?} Hz; FFT peak {:?} Hz",
        track.voiced_frames(),
        track.f0.len(),
        tracker_median_hz,
        dominant_hz
    );

    let median_pitch_hz = fuse_estimates(tracker_median_hz, dominant_hz);
    let Some(pitch) = median_pitch_hz else {
        warn!("No pitched content detected");
        return PitchAnalysis {
            tracker_median_hz,
            dominant_hz,
            ..PitchAnalysis::default()
        };
    };

    let detected_key = note_name(pitch);
    info!(
        "Detected key: {}, median pitch: {:.1}Hz",
        detected_key.as_deref().unwrap_or("?"),
        pitch
    );

    PitchAnalysis {
        detected_key,
        median_pitch_hz,
        tracker_median_hz,
        dominant_hz,
    }
}
