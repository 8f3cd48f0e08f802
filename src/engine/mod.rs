//! Audio Engine Module
//!
//! Core audio plumbing shared by the enhancer and the mixer:
//! - Audio buffer management
//! - Sample-rate conversion
//! - File I/O operations

pub mod buffer;
pub mod io;
pub mod resample;

pub use buffer::{
    calculate_peak, calculate_rms, db_to_linear, linear_to_db, AudioBuffer, DEFAULT_SAMPLE_RATE,
};
pub use io::{ensure_exists, generate_test_tone, load_wav, load_wav_at, write_json, write_wav, WavFormat};
pub use resample::{resample, resample_linear};
