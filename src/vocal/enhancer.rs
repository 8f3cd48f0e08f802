//! Vocal enhancement chain
//!
//! resample -> spectral gate -> 80 Hz high-pass -> pitch/key analysis ->
//! (pitch correction) -> (formant shift) -> doubler
//!
//! Pitch correction and formant shifting are accepted as options but not
//! implemented: requesting them logs a warning and they are always reported
//! as not applied.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{EnhancerConfig, EnhancerOverrides};
use crate::dsp::{analyze_pitch, ButterworthHighPass, Doubler, Effect, SpectralGate};
use crate::engine::{load_wav, resample, write_json, write_wav, AudioBuffer, WavFormat};
use crate::error::Result;
use crate::vocal::metadata::{ProcessingStep, VocalMetadata};

/// Formant shifts smaller than this count as "not requested"
const FORMANT_SHIFT_EPSILON: f32 = 0.01;

/// Length of the excerpt processed by a dry run
pub const DRY_RUN_SECONDS: f32 = 5.0;

/// Enhances dry vocal recordings
#[derive(Debug, Clone, Default)]
pub struct VocalEnhancer {
    config: EnhancerConfig,
}

impl VocalEnhancer {
    /// Create an enhancer with validated settings
    pub fn new(config: EnhancerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Run the chain over an in-memory buffer
    ///
    /// # Errors
    /// * `EmptyAudio` - input has no frames
    /// * `InvalidSampleRate` - input rate is zero
    /// * `InvalidConfig` - overrides produce an invalid config
    pub fn enhance(
        &self,
        input: &AudioBuffer,
        overrides: Option<&EnhancerOverrides>,
    ) -> Result<(AudioBuffer, VocalMetadata)> {
        input.validate()?;
        let config = match overrides {
            Some(o) => o.apply(&self.config)?,
            None => self.config.clone(),
        };

        let audio = if input.sample_rate != config.sample_rate {
            warn!(
                "Resampling from {}Hz to {}Hz",
                input.sample_rate, config.sample_rate
            );
            resample(input, config.sample_rate)?
        } else {
            input.clone()
        };

        let denoised = SpectralGate::new(config.denoise_db).process(&audio);
        let denoise_applied = denoised.applied();
        let snr_db = denoised.snr_db;

        let filtered = ButterworthHighPass::vocal_rumble().apply(&denoised.buffer);

        let pitch = analyze_pitch(&filtered);
        let pitch_detected = pitch.detected_key.is_some();

        if config.pitch_correction {
            warn!("Pitch correction requested but not implemented; leaving pitch untouched");
        }
        if config.formant_shift.abs() > FORMANT_SHIFT_EPSILON {
            warn!(
                "Formant shift of {} requested but not implemented; leaving formants untouched",
                config.formant_shift
            );
        }

        let doubler = Doubler::new(config.doubler_mix);
        let doubled = doubler.apply(&filtered);

        let metadata = VocalMetadata::new(
            pitch.detected_key,
            pitch.median_pitch_hz,
            snr_db,
            &[
                (ProcessingStep::SpectralDenoise, denoise_applied),
                (ProcessingStep::HighpassFilter, true),
                (ProcessingStep::PitchDetection, pitch_detected),
                (ProcessingStep::PitchCorrection, false),
                (ProcessingStep::FormantShift, false),
                (ProcessingStep::VocalDoubler, doubler.is_active()),
            ],
        );

        Ok((doubled, metadata))
    }

    /// Enhance a WAV file, writing the result and its JSON side-car
    ///
    /// The side-car lands next to `output` with a `.json` extension.
    pub fn enhance_file(
        &self,
        input: &Path,
        output: &Path,
        overrides: Option<&EnhancerOverrides>,
    ) -> Result<(PathBuf, VocalMetadata)> {
        self.enhance_file_excerpt(input, output, overrides, None)
    }

    /// Like [`enhance_file`](Self::enhance_file), processing at most the
    /// first `max_seconds` of the input
    pub fn enhance_file_excerpt(
        &self,
        input: &Path,
        output: &Path,
        overrides: Option<&EnhancerOverrides>,
        max_seconds: Option<f32>,
    ) -> Result<(PathBuf, VocalMetadata)> {
        info!("Loading vocals from {}", input.display());
        let mut source = load_wav(input)?;
        if let Some(seconds) = max_seconds {
            let limit = (seconds.max(0.0) * source.sample_rate as f32) as usize;
            if limit < source.num_samples() {
                info!("Processing the first {:.1}s only", seconds);
                source = source.fit_to_length(limit);
            }
        }

        let (enhanced, metadata) = self.enhance(&source, overrides)?;

        write_wav(&enhanced, output, WavFormat::default())?;
        info!("Enhanced vocals saved to {}", output.display());

        let sidecar = VocalMetadata::sidecar_path(output);
        write_json(&metadata, &sidecar)?;
        info!("Metadata saved to {}", sidecar.display());

        Ok((output.to_path_buf(), metadata))
    }
}
