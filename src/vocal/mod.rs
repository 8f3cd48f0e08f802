//! Vocal processing
//!
//! Turns a dry vocal take into an enhanced one plus a metadata record of
//! what was detected and which steps took effect.

pub mod enhancer;
pub mod metadata;

pub use enhancer::VocalEnhancer;
pub use metadata::{ProcessingStep, VocalMetadata};
