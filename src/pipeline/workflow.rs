//! End-to-end run: vocal selection, mix, master, report

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::PipelineConfig;
use crate::engine::{ensure_exists, load_wav, load_wav_at, write_json, write_wav, WavFormat};
use crate::error::Result;
use crate::mixer::StemMixer;
use crate::pipeline::artifacts::{ArtifactParts, PipelineArtifacts, REPORT_FILE};
use crate::pipeline::controller::VocalController;
use crate::pipeline::converter::{RvcCommandConverter, VoiceConverter};
use crate::pipeline::mode::VocalMode;
use crate::vocal::VocalEnhancer;

/// Vocal take used when a run names none
pub const DEFAULT_VOCAL_FILE: &str = "dry_vocals.wav";

/// Inputs for one run
///
/// The instrumental, story and lyrics are produced by upstream
/// collaborators; the pipeline only consumes them.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub instrumental: PathBuf,
    /// Dry vocal take; defaults to `<output_root>/dry_vocals.wav`
    pub vocal: Option<PathBuf>,
    pub story: serde_json::Value,
    pub lyrics_path: Option<PathBuf>,
}

impl PipelineInputs {
    pub fn new(instrumental: impl Into<PathBuf>) -> Self {
        Self {
            instrumental: instrumental.into(),
            ..Self::default()
        }
    }

    pub fn with_vocal(mut self, vocal: impl Into<PathBuf>) -> Self {
        self.vocal = Some(vocal.into());
        self
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    mixer: StemMixer,
    controller: VocalController,
}

impl Pipeline {
    /// Build a pipeline; an RVC converter is attached when `rvc.rvc_root` is set
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let converter = RvcCommandConverter::from_config(&config.rvc)
            .map(|c| Box::new(c) as Box<dyn VoiceConverter>);
        Self::build(config, converter)
    }

    /// Build a pipeline around a caller-supplied converter
    pub fn with_converter(config: PipelineConfig, converter: Box<dyn VoiceConverter>) -> Result<Self> {
        Self::build(config, Some(converter))
    }

    fn build(config: PipelineConfig, converter: Option<Box<dyn VoiceConverter>>) -> Result<Self> {
        config.validate()?;
        let mixer = StemMixer::new(config.mixing.clone())?;
        let enhancer = VocalEnhancer::new(config.enhancer.clone())?;
        let mode = VocalMode::parse_or_raw(&config.vocal_mode);

        let mut controller = VocalController::new(mode, config.rvc_blend, enhancer, mixer.clone())?;
        if let Some(converter) = converter {
            controller = controller.with_converter(converter);
        }

        Ok(Self {
            config,
            mixer,
            controller,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn vocal_mode(&self) -> VocalMode {
        self.controller.mode()
    }

    pub fn vocal_source(&self, inputs: &PipelineInputs) -> PathBuf {
        inputs
            .vocal
            .clone()
            .unwrap_or_else(|| self.config.output_root.join(DEFAULT_VOCAL_FILE))
    }

    /// Run the whole chain
    ///
    /// Both inputs are checked and decoded before anything is written.
    ///
    /// # Errors
    /// * `FileNotFound` - instrumental or vocal missing
    /// * `InvalidAudio` / `UnsupportedFormat` - undecodable input
    /// * `ConverterError` - the voice converter failed
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineArtifacts> {
        let vocal_path = self.vocal_source(inputs);
        ensure_exists(&inputs.instrumental)?;
        if let Err(e) = ensure_exists(&vocal_path) {
            warn!(
                "Missing vocal source at {}. Record a guide vocal and rerun.",
                vocal_path.display()
            );
            return Err(e);
        }

        let instrumental = load_wav_at(&inputs.instrumental, self.mixer.sample_rate())?;
        let source = load_wav(&vocal_path)?;
        info!(
            "Loaded instrumental ({:.1}s) and vocals ({:.1}s)",
            instrumental.duration_secs(),
            source.duration_secs()
        );

        let output_root = &self.config.output_root;
        let vocal = self.controller.resolve(&source, &vocal_path, output_root)?;

        let mixed = self
            .mixer
            .mix(&instrumental, &vocal.audio, &self.mixer.default_options())?;
        let mastered = self
            .mixer
            .normalize_lufs(&mixed, self.config.mixing.target_lufs)?;
        let mix_path = write_wav(&mastered, &self.config.mix_path(), WavFormat::default())?;
        info!("Final mix saved to {}", mix_path.display());

        let artifacts = PipelineArtifacts::seal(ArtifactParts {
            vocal_mode: self.controller.mode(),
            story: inputs.story.clone(),
            lyrics_path: inputs.lyrics_path.clone(),
            instrumental_path: inputs.instrumental.clone(),
            enhanced_vocal_path: vocal.enhanced_path,
            final_vocal_path: vocal.final_path,
            mix_path,
            vocal_metadata: vocal.metadata,
        })?;
        write_json(&artifacts, &report_path(output_root))?;

        Ok(artifacts)
    }
}

/// Where a run's report lands
pub fn report_path(output_root: &Path) -> PathBuf {
    output_root.join(REPORT_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HitmixError;
    use tempfile::tempdir;

    #[test]
    fn test_default_vocal_source() {
        let config = PipelineConfig {
            output_root: PathBuf::from("/tmp/run"),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        let inputs = PipelineInputs::new("beat.wav");
        assert_eq!(
            pipeline.vocal_source(&inputs),
            PathBuf::from("/tmp/run/dry_vocals.wav")
        );
        let inputs = inputs.with_vocal("/takes/one.wav");
        assert_eq!(pipeline.vocal_source(&inputs), PathBuf::from("/takes/one.wav"));
    }

    #[test]
    fn test_unknown_mode_resolves_raw() {
        let config = PipelineConfig {
            vocal_mode: "autotune".to_string(),
            ..PipelineConfig::default()
        };
        assert_eq!(Pipeline::new(config).unwrap().vocal_mode(), VocalMode::Raw);
    }

    #[test]
    fn test_missing_instrumental_fails_first() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            output_root: dir.path().join("out"),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        let err = pipeline
            .run(&PipelineInputs::new(dir.path().join("nope.wav")))
            .unwrap_err();
        assert!(matches!(err, HitmixError::FileNotFound { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
