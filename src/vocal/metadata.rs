//! Vocal metadata side-car

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stages of the enhancement chain, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessingStep {
    SpectralDenoise,
    HighpassFilter,
    PitchDetection,
    PitchCorrection,
    FormantShift,
    VocalDoubler,
}

impl ProcessingStep {
    pub const ALL: [ProcessingStep; 6] = [
        ProcessingStep::SpectralDenoise,
        ProcessingStep::HighpassFilter,
        ProcessingStep::PitchDetection,
        ProcessingStep::PitchCorrection,
        ProcessingStep::FormantShift,
        ProcessingStep::VocalDoubler,
    ];

    /// Key used in `processing_applied`
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::SpectralDenoise => "spectral_denoise",
            ProcessingStep::HighpassFilter => "highpass_filter",
            ProcessingStep::PitchDetection => "pitch_detection",
            ProcessingStep::PitchCorrection => "pitch_correction",
            ProcessingStep::FormantShift => "formant_shift",
            ProcessingStep::VocalDoubler => "vocal_doubler",
        }
    }
}

impl fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the enhancer found and which steps changed the signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocalMetadata {
    pub detected_key: Option<String>,
    pub median_pitch_hz: Option<f32>,
    pub snr_db: Option<f32>,
    pub processing_applied: BTreeMap<String, bool>,
}

impl VocalMetadata {
    /// Build from analysis results and per-step flags
    pub fn new(
        detected_key: Option<String>,
        median_pitch_hz: Option<f32>,
        snr_db: Option<f32>,
        steps: &[(ProcessingStep, bool)],
    ) -> Self {
        Self {
            detected_key,
            median_pitch_hz,
            snr_db,
            processing_applied: steps
                .iter()
                .map(|(step, applied)| (step.as_str().to_string(), *applied))
                .collect(),
        }
    }

    /// Whether `step` altered the signal (false when not recorded)
    pub fn applied(&self, step: ProcessingStep) -> bool {
        self.processing_applied
            .get(step.as_str())
            .copied()
            .unwrap_or(false)
    }

    /// Side-car location for an enhanced WAV: same stem, `.json` extension
    pub fn sidecar_path(audio_path: &Path) -> PathBuf {
        audio_path.with_extension("json")
    }
}
