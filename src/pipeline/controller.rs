//! Vocal-mode controller
//!
//! Picks exactly one vocal path per run. Mixing and mastering downstream are
//! the same whichever path was taken.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::engine::{load_wav, write_json, write_wav, AudioBuffer, WavFormat};
use crate::error::{HitmixError, Result};
use crate::mixer::StemMixer;
use crate::pipeline::converter::VoiceConverter;
use crate::pipeline::mode::VocalMode;
use crate::vocal::{VocalEnhancer, VocalMetadata};

pub const ENHANCED_VOCALS_FILE: &str = "enhanced_vocals.wav";
pub const STYLED_VOCALS_FILE: &str = "styled_vocals.wav";
pub const BLENDED_VOCALS_FILE: &str = "blended_vocals.wav";

/// The vocal a run will mix
#[derive(Debug, Clone)]
pub struct ResolvedVocal {
    pub audio: AudioBuffer,
    pub final_path: PathBuf,
    pub enhanced_path: Option<PathBuf>,
    pub metadata: Option<VocalMetadata>,
}

pub struct VocalController {
    mode: VocalMode,
    rvc_blend: f32,
    enhancer: VocalEnhancer,
    mixer: StemMixer,
    converter: Option<Box<dyn VoiceConverter>>,
}

impl VocalController {
    pub fn new(
        mode: VocalMode,
        rvc_blend: f32,
        enhancer: VocalEnhancer,
        mixer: StemMixer,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&rvc_blend) {
            return Err(HitmixError::invalid_config(
                "rvc_blend",
                format!("{} is outside [0, 1]", rvc_blend),
            ));
        }
        Ok(Self {
            mode,
            rvc_blend,
            enhancer,
            mixer,
            converter: None,
        })
    }

    pub fn with_converter(mut self, converter: Box<dyn VoiceConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn mode(&self) -> VocalMode {
        self.mode
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Produce the final vocal for `source`
    ///
    /// Intermediate takes are written into `work_dir`. In raw mode nothing is
    /// written and the source path is reported as the final vocal.
    pub fn resolve(
        &self,
        source: &AudioBuffer,
        source_path: &Path,
        work_dir: &Path,
    ) -> Result<ResolvedVocal> {
        info!("Resolving vocals in {} mode", self.mode);
        match self.mode {
            VocalMode::Raw => Ok(ResolvedVocal {
                audio: source.clone(),
                final_path: source_path.to_path_buf(),
                enhanced_path: None,
                metadata: None,
            }),
            VocalMode::Enhanced => self.enhance(source, work_dir),
            VocalMode::Rvc => {
                let enhanced = self.enhance(source, work_dir)?;
                self.convert(enhanced, work_dir)
            }
        }
    }

    fn enhance(&self, source: &AudioBuffer, work_dir: &Path) -> Result<ResolvedVocal> {
        let (audio, metadata) = self.enhancer.enhance(source, None)?;
        let path = write_wav(&audio, &work_dir.join(ENHANCED_VOCALS_FILE), WavFormat::default())?;
        write_json(&metadata, &VocalMetadata::sidecar_path(&path))?;
        info!("Enhanced vocals saved to {}", path.display());
        Ok(ResolvedVocal {
            audio,
            final_path: path.clone(),
            enhanced_path: Some(path),
            metadata: Some(metadata),
        })
    }

    fn convert(&self, enhanced: ResolvedVocal, work_dir: &Path) -> Result<ResolvedVocal> {
        let Some(converter) = self.converter.as_deref() else {
            warn!("Voice conversion is not configured; using enhanced vocals");
            return Ok(enhanced);
        };

        let styled_path = converter.convert(&enhanced.final_path, &work_dir.join(STYLED_VOCALS_FILE))?;
        let styled = load_wav(&styled_path)?;

        if self.rvc_blend >= 1.0 {
            info!("Using {} output as the final vocal", converter.name());
            return Ok(ResolvedVocal {
                audio: styled,
                final_path: styled_path,
                ..enhanced
            });
        }

        let blended = self
            .mixer
            .blend_vocals(&enhanced.audio, &styled, self.rvc_blend)?;
        let blended_path = write_wav(
            &blended,
            &work_dir.join(BLENDED_VOCALS_FILE),
            WavFormat::default(),
        )?;
        info!(
            "Blended enhanced and {} vocals at {:.2}",
            converter.name(),
            self.rvc_blend
        );
        Ok(ResolvedVocal {
            audio: blended,
            final_path: blended_path,
            ..enhanced
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use tempfile::tempdir;

    fn controller(mode: VocalMode) -> VocalController {
        VocalController::new(mode, 0.7, VocalEnhancer::default(), StemMixer::default()).unwrap()
    }

    #[test]
    fn test_raw_passes_through() {
        let dir = tempdir().unwrap();
        let source = generate_test_tone(440.0, 0.4, 0.5, 44100);
        let source_path = dir.path().join("dry.wav");
        let resolved = controller(VocalMode::Raw)
            .resolve(&source, &source_path, dir.path())
            .unwrap();
        assert_eq!(resolved.audio, source);
        assert_eq!(resolved.final_path, source_path);
        assert!(resolved.metadata.is_none());
        assert!(!dir.path().join(ENHANCED_VOCALS_FILE).exists());
    }

    #[test]
    fn test_rvc_without_converter_uses_enhanced() {
        let dir = tempdir().unwrap();
        let source = generate_test_tone(440.0, 0.4, 0.5, 44100);
        let resolved = controller(VocalMode::Rvc)
            .resolve(&source, &dir.path().join("dry.wav"), dir.path())
            .unwrap();
        let enhanced = dir.path().join(ENHANCED_VOCALS_FILE);
        assert_eq!(resolved.final_path, enhanced);
        assert_eq!(resolved.enhanced_path, Some(enhanced));
        assert!(dir.path().join("enhanced_vocals.json").exists());
        assert!(resolved.metadata.is_some());
    }

    #[test]
    fn test_blend_out_of_range_rejected() {
        let result = VocalController::new(
            VocalMode::Rvc,
            1.5,
            VocalEnhancer::default(),
            StemMixer::default(),
        );
        assert!(result.is_err());
    }
}
