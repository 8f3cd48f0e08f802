//! Gain Effect
//!
//! Static gain stage used for stem balancing and loudness correction.

use crate::dsp::effect::Effect;
use crate::engine::buffer::db_to_linear;
use crate::engine::AudioBuffer;

/// Static gain in decibels
///
/// Unlike a fader this applies the exact `10^(db/20)` factor with no
/// clamping of the setting; clipping is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    gain_db: f32,
}

impl Gain {
    /// Create a new gain effect
    pub fn new(gain_db: f32) -> Self {
        Self { gain_db }
    }

    /// Get the current gain in decibels
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Get the linear gain multiplier
    pub fn gain_linear(&self) -> f32 {
        db_to_linear(self.gain_db)
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Effect for Gain {
    fn effect_type(&self) -> &'static str {
        "gain"
    }

    fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        buffer.apply_gain(self.gain_db)
    }
}
