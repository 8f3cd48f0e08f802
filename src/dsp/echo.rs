//! Single-tap echo used on the vocal bus before summing.

use crate::dsp::effect::Effect;
use crate::engine::AudioBuffer;

/// Default echo delay in seconds
pub const DEFAULT_ECHO_DELAY_SECS: f32 = 0.25;

/// Default echo feed level
pub const DEFAULT_ECHO_DECAY: f32 = 0.35;

/// `y[n] = x[n] + decay * x[n - delay]`, clipped to full scale
///
/// The tap is not fed back, so there is exactly one repeat. Output length
/// equals input length: the repeat of the last `delay` samples is cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Echo {
    delay_seconds: f32,
    decay: f32,
}

impl Echo {
    pub fn new(delay_seconds: f32, decay: f32) -> Self {
        Self {
            delay_seconds,
            decay,
        }
    }

    /// Delay in whole samples at `sample_rate` (truncated)
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        let delay = self.delay_seconds * sample_rate as f32;
        if delay.is_finite() && delay > 0.0 {
            delay as usize
        } else {
            0
        }
    }
}

impl Default for Echo {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_DELAY_SECS, DEFAULT_ECHO_DECAY)
    }
}

impl Effect for Echo {
    fn effect_type(&self) -> &'static str {
        "echo"
    }

    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let delay = self.delay_samples(buffer.sample_rate);
        if delay == 0 {
            return buffer.clone();
        }

        let samples = buffer
            .samples
            .iter()
            .map(|ch| {
                ch.iter()
                    .enumerate()
                    .map(|(i, &dry)| {
                        let wet = if i >= delay { ch[i - delay] * self.decay } else { 0.0 };
                        (dry + wet).clamp(-1.0, 1.0)
                    })
                    .collect()
            })
            .collect();

        AudioBuffer {
            samples,
            sample_rate: buffer.sample_rate,
        }
    }
}
