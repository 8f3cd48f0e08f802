//! Pipeline
//!
//! Orchestrates one run: choose the vocal path, optionally hand the take to
//! an external voice converter, then mix, master and report.

pub mod artifacts;
pub mod controller;
pub mod converter;
pub mod mode;
pub mod workflow;

pub use artifacts::{file_sha256, PipelineArtifacts, REPORT_FILE};
pub use controller::{ResolvedVocal, VocalController};
pub use converter::{RvcCommandConverter, VoiceConverter};
pub use mode::VocalMode;
pub use workflow::{report_path, Pipeline, PipelineInputs, DEFAULT_VOCAL_FILE};
