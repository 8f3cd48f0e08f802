//! Configuration
//!
//! Typed settings for the enhancer, the mixer and the end-to-end pipeline.
//! Every struct deserializes with defaults for missing keys and is validated
//! once before use. Per-call overrides produce a new effective config; the
//! shared instance is never mutated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsp::denoise::DEFAULT_DENOISE_DB;
use crate::dsp::doubler::DEFAULT_DOUBLER_MIX;
use crate::dsp::echo::{DEFAULT_ECHO_DECAY, DEFAULT_ECHO_DELAY_SECS};
use crate::dsp::loudness::DEFAULT_TARGET_LUFS;
use crate::engine::DEFAULT_SAMPLE_RATE;
use crate::error::{HitmixError, Result};

/// Default blend weight of the converted take in rvc mode
pub const DEFAULT_RVC_BLEND: f32 = 0.7;

fn check_rate(field: &str, rate: u32) -> Result<()> {
    if rate == 0 {
        return Err(HitmixError::invalid_config(field, "sample rate must be positive"));
    }
    Ok(())
}

fn check_finite(field: &str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(HitmixError::invalid_config(field, format!("{} is not finite", value)));
    }
    Ok(())
}

fn check_unit(field: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(HitmixError::invalid_config(
            field,
            format!("{} is outside [0, 1]", value),
        ));
    }
    Ok(())
}

// ============================================================================
// Enhancer
// ============================================================================

/// Vocal enhancement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Processing rate; input is resampled to this once
    pub sample_rate: u32,
    /// Spectral gate depth in dB
    pub denoise_db: f32,
    /// Requested formant shift (not implemented, reported as not applied)
    pub formant_shift: f32,
    /// Doubler wet level, 0 disables
    pub doubler_mix: f32,
    /// Requested pitch correction (not implemented, reported as not applied)
    pub pitch_correction: bool,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            denoise_db: DEFAULT_DENOISE_DB,
            formant_shift: 0.0,
            doubler_mix: DEFAULT_DOUBLER_MIX,
            pitch_correction: false,
        }
    }
}

impl EnhancerConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate("sample_rate", self.sample_rate)?;
        check_finite("denoise_db", self.denoise_db)?;
        check_finite("formant_shift", self.formant_shift)?;
        check_unit("doubler_mix", self.doubler_mix)
    }
}

/// Per-call enhancer overrides; unset fields keep the base value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerOverrides {
    pub denoise_db: Option<f32>,
    pub formant_shift: Option<f32>,
    pub doubler_mix: Option<f32>,
    pub pitch_correction: Option<bool>,
}

impl EnhancerOverrides {
    /// Merge onto `base`, returning a new validated config
    pub fn apply(&self, base: &EnhancerConfig) -> Result<EnhancerConfig> {
        let merged = EnhancerConfig {
            sample_rate: base.sample_rate,
            denoise_db: self.denoise_db.unwrap_or(base.denoise_db),
            formant_shift: self.formant_shift.unwrap_or(base.formant_shift),
            doubler_mix: self.doubler_mix.unwrap_or(base.doubler_mix),
            pitch_correction: self.pitch_correction.unwrap_or(base.pitch_correction),
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ============================================================================
// Mixer
// ============================================================================

/// Stem mixing and mastering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    pub sample_rate: u32,
    pub instrumental_gain_db: f32,
    pub vocal_gain_db: f32,
    pub add_vocal_echo: bool,
    pub echo_delay_seconds: f32,
    pub echo_decay: f32,
    pub target_lufs: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            instrumental_gain_db: -3.0,
            vocal_gain_db: -1.0,
            add_vocal_echo: true,
            echo_delay_seconds: DEFAULT_ECHO_DELAY_SECS,
            echo_decay: DEFAULT_ECHO_DECAY,
            target_lufs: DEFAULT_TARGET_LUFS,
        }
    }
}

impl MixerConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate("sample_rate", self.sample_rate)?;
        check_finite("instrumental_gain_db", self.instrumental_gain_db)?;
        check_finite("vocal_gain_db", self.vocal_gain_db)?;
        check_finite("echo_delay_seconds", self.echo_delay_seconds)?;
        if self.echo_delay_seconds < 0.0 {
            return Err(HitmixError::invalid_config(
                "echo_delay_seconds",
                "delay cannot be negative",
            ));
        }
        check_unit("echo_decay", self.echo_decay)?;
        check_finite("target_lufs", self.target_lufs)?;
        if self.target_lufs >= 0.0 {
            return Err(HitmixError::invalid_config(
                "target_lufs",
                "loudness target must be below 0 LUFS",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Voice conversion
// ============================================================================

/// External RVC-WebUI converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RvcConfig {
    /// Checkout of RVC-WebUI; conversion is disabled when unset
    pub rvc_root: Option<PathBuf>,
    /// Voice model copied into `<rvc_root>/weights` before inference
    pub voice_model_path: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub config_name: String,
    pub f0_method: String,
    pub python_bin: String,
}

impl Default for RvcConfig {
    fn default() -> Self {
        Self {
            rvc_root: None,
            voice_model_path: None,
            index_path: None,
            config_name: "default".to_string(),
            f0_method: "rmvpe".to_string(),
            python_bin: "python".to_string(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// End-to-end settings loaded from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rate shared by the enhancer and the mixer
    pub sample_rate: u32,
    /// `raw`, `enhanced` or `rvc`; anything else behaves as `raw`
    pub vocal_mode: String,
    /// Weight of the converted take when blending in rvc mode
    pub rvc_blend: f32,
    pub output_root: PathBuf,
    pub mixdown_filename: String,
    pub enhancer: EnhancerConfig,
    pub mixing: MixerConfig,
    pub rvc: RvcConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            vocal_mode: "enhanced".to_string(),
            rvc_blend: DEFAULT_RVC_BLEND,
            output_root: PathBuf::from("output"),
            mixdown_filename: "final_mix.wav".to_string(),
            enhancer: EnhancerConfig::default(),
            mixing: MixerConfig::default(),
            rvc: RvcConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing keys take their defaults
    ///
    /// The top-level `sample_rate` is propagated to the enhancer and mixer.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HitmixError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        let config = config.with_sample_rate(config.sample_rate);
        config.validate()?;
        Ok(config)
    }

    /// Copy with one sample rate applied to every stage
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        let mut next = self.clone();
        next.sample_rate = sample_rate;
        next.enhancer.sample_rate = sample_rate;
        next.mixing.sample_rate = sample_rate;
        next
    }

    pub fn validate(&self) -> Result<()> {
        check_rate("sample_rate", self.sample_rate)?;
        check_unit("rvc_blend", self.rvc_blend)?;
        if self.mixdown_filename.trim().is_empty() {
            return Err(HitmixError::invalid_config(
                "mixdown_filename",
                "file name cannot be empty",
            ));
        }
        self.enhancer.validate()?;
        self.mixing.validate()
    }

    pub fn mix_path(&self) -> PathBuf {
        self.output_root.join(&self.mixdown_filename)
    }
}
