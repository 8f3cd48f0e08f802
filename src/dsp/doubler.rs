//! Vocal doubler
//!
//! Simulates a second take: the vocal is detuned slightly sharp, delayed a
//! few milliseconds and blended back under the dry signal.

use crate::dsp::effect::Effect;
use crate::dsp::pitch_shift::PitchShifter;
use crate::engine::AudioBuffer;

/// Detune of the doubled copy
pub const DOUBLER_DETUNE_CENTS: f32 = 8.0;

/// Delay of the doubled copy
pub const DOUBLER_DELAY_MS: f32 = 15.0;

/// Default wet level
pub const DEFAULT_DOUBLER_MIX: f32 = 0.35;

/// `dry * (1 - mix) + delayed_detuned * mix`, clipped
#[derive(Debug)]
pub struct Doubler {
    mix: f32,
    delay_ms: f32,
    shifter: PitchShifter,
}

impl Doubler {
    pub fn new(mix: f32) -> Self {
        Self {
            mix,
            delay_ms: DOUBLER_DELAY_MS,
            shifter: PitchShifter::new(DOUBLER_DETUNE_CENTS),
        }
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// A zero mix leaves the signal untouched
    pub fn is_active(&self) -> bool {
        self.mix > 0.0
    }

    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        ((self.delay_ms / 1000.0) * sample_rate as f32) as usize
    }
}

impl Default for Doubler {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLER_MIX)
    }
}

impl Effect for Doubler {
    fn effect_type(&self) -> &'static str {
        "vocal_doubler"
    }

    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        if !self.is_active() {
            return buffer.clone();
        }

        let delay = self.delay_samples(buffer.sample_rate);
        let samples = buffer
            .samples
            .iter()
            .map(|dry| {
                let doubled = self.shifter.shift(dry);
                dry.iter()
                    .enumerate()
                    .map(|(i, &d)| {
                        let wet = if i >= delay { doubled[i - delay] } else { 0.0 };
                        (d * (1.0 - self.mix) + wet * self.mix).clamp(-1.0, 1.0)
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
