//! Effect trait definition
//!
//! Every stage of the vocal chain and the mix bus is an [`Effect`]: a pure
//! transform from one buffer to a new one. Effects carry their settings but
//! no running state; filter memory lives only for the duration of `apply`.

use crate::engine::AudioBuffer;

/// Base trait for all DSP effects
pub trait Effect: Send + Sync {
    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Process `buffer` into a new buffer of the same shape and rate
    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer;
}

/// Run a buffer through a sequence of effects in order
pub fn apply_chain(effects: &[&dyn Effect], buffer: &AudioBuffer) -> AudioBuffer {
    effects
        .iter()
        .fold(buffer.clone(), |acc, effect| effect.apply(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Gain;

    #[test]
    fn test_chain_applies_in_order() {
        let buffer = AudioBuffer::mono(vec![0.5; 8], 44100).unwrap();
        let down = Gain::new(-6.0);
        let up = Gain::new(6.0);
        let out = apply_chain(&[&down, &up], &buffer);
        for s in out.channel(0) {
            assert!((s - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let buffer = AudioBuffer::mono(vec![0.25; 4], 44100).unwrap();
        assert_eq!(apply_chain(&[], &buffer), buffer);
    }
}
