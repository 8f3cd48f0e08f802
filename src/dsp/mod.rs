//! DSP Library
//!
//! Signal processing building blocks for the vocal chain and the mix bus.
//! Buffer-to-buffer stages implement the `Effect` trait; analysis stages
//! (denoise, pitch, loudness) return explicit result types instead.

pub mod denoise;
pub mod doubler;
pub mod echo;
pub mod effect;
pub mod filter;
pub mod gain;
pub mod loudness;
pub mod pitch;
pub mod pitch_shift;
pub mod stft;

pub use denoise::{DenoiseFailure, DenoiseOutcome, SpectralGate};
pub use doubler::Doubler;
pub use echo::Echo;
pub use effect::{apply_chain, Effect};
pub use filter::ButterworthHighPass;
pub use gain::Gain;
pub use loudness::integrated_loudness;
pub use pitch::{analyze as analyze_pitch, PitchAnalysis, PitchTrack, PitchTracker};
pub use pitch_shift::PitchShifter;
pub use stft::Stft;
