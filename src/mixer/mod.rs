//! Stem mixing and mastering

pub mod stem;

pub use stem::{MixOptions, StemMixer};
