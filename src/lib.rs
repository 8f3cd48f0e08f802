//! Hitmix - Vocal Enhancement and Mix Engine
//!
//! Takes a dry vocal take and an instrumental backing track and produces a
//! mastered stereo mix.
//!
//! # Architecture
//!
//! - `vocal`: denoise, high-pass, pitch/key analysis and doubling of a dry take
//! - `mixer`: gain-staged stem summing, loudness normalization, take blending
//! - `pipeline`: picks the vocal path (raw, enhanced, voice-converted) and
//!   runs mix and master
//!
//! `engine` and `dsp` hold the buffer type, file I/O and the signal
//! processing blocks the above are built from.

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod pipeline;
pub mod vocal;

pub use error::{HitmixError, Result};
