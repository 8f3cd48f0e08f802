//! Butterworth high-pass filter
//!
//! An order-N Butterworth response built from N/2 cascaded biquad sections.
//! Each section uses the Audio EQ Cookbook high-pass, which shares the
//! bilinear-transform prewarping of the analog prototype, so the cascade has
//! the exact Butterworth magnitude response at every sample rate.

use std::f64::consts::PI;

use crate::dsp::effect::Effect;
use crate::engine::AudioBuffer;

/// Rumble cutoff for the vocal chain
pub const VOCAL_HIGHPASS_HZ: f32 = 80.0;

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// High-pass section, Audio EQ Cookbook
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    fn high_pass(sample_rate: f64, frequency: f64, q: f64) -> Self {
        // Keep the cutoff below Nyquist
        let freq = frequency.clamp(1.0, sample_rate / 2.0 - 1.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        let b2 = (1.0 + cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Direct Form I
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Section Q values for an even-order Butterworth cascade
///
/// Pole pair k of an order-N prototype sits at angle `(2k+1)π/(2N)`, giving
/// `Q = 1 / (2 cos θ)`. For N = 4 that is 0.5412 and 1.3066.
pub fn butterworth_section_qs(order: usize) -> Vec<f64> {
    let n = order as f64;
    (0..order / 2)
        .map(|k| {
            let theta = (2 * k + 1) as f64 * PI / (2.0 * n);
            1.0 / (2.0 * theta.cos())
        })
        .collect()
}

/// Zero-initial-state Butterworth high-pass
#[derive(Debug, Clone, PartialEq)]
pub struct ButterworthHighPass {
    cutoff_hz: f32,
    order: usize,
}

impl ButterworthHighPass {
    /// Create a high-pass of even `order` (odd orders round down)
    pub fn new(cutoff_hz: f32, order: usize) -> Self {
        Self {
            cutoff_hz,
            order: (order / 2).max(1) * 2,
        }
    }

    /// The 4th-order 80 Hz rumble filter from the vocal chain
    pub fn vocal_rumble() -> Self {
        Self::new(VOCAL_HIGHPASS_HZ, 4)
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn order(&self) -> usize {
        self.order
    }

    fn sections(&self, sample_rate: u32) -> Vec<BiquadCoeffs> {
        butterworth_section_qs(self.order)
            .into_iter()
            .map(|q| BiquadCoeffs::high_pass(sample_rate as f64, self.cutoff_hz as f64, q))
            .collect()
    }

    fn filter_channel(&self, channel: &[f32], sections: &[BiquadCoeffs]) -> Vec<f32> {
        let mut states = vec![BiquadState::default(); sections.len()];
        channel
            .iter()
            .map(|&x| {
                let y = sections
                    .iter()
                    .zip(states.iter_mut())
                    .fold(x as f64, |acc, (coeffs, state)| state.process(acc, coeffs));
                y as f32
            })
            .collect()
    }
}

impl Default for ButterworthHighPass {
    fn default() -> Self {
        Self::vocal_rumble()
    }
}

impl Effect for ButterworthHighPass {
    fn effect_type(&self) -> &'static str {
        "highpass"
    }

    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let sections = self.sections(buffer.sample_rate);
        AudioBuffer {
            samples: buffer
                .samples
                .iter()
                .map(|ch| self.filter_channel(ch, &sections))
                .collect(),
            sample_rate: buffer.sample_rate,
        }
    }
}
