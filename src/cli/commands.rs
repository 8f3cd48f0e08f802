//! CLI Command Implementations
//!
//! Each command is a thin wrapper over the library: build the config, call
//! one operation, print where the result went.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::cli::VocalModeArg;
use crate::config::{EnhancerConfig, EnhancerOverrides, MixerConfig, PipelineConfig};
use crate::error::Result;
use crate::mixer::{MixOptions, StemMixer};
use crate::pipeline::{Pipeline, PipelineInputs};
use crate::vocal::enhancer::DRY_RUN_SECONDS;
use crate::vocal::VocalEnhancer;

/// Settings for `hitmix enhance`
#[derive(Debug, Clone, Default)]
pub struct EnhanceArgs {
    pub sample_rate: Option<u32>,
    pub overrides: EnhancerOverrides,
    /// Only process the first few seconds
    pub dry_run: bool,
}

/// Enhance one vocal file.
pub fn enhance(input: &Path, output: &Path, args: &EnhanceArgs) -> Result<()> {
    info!("Enhancing vocals: {}", input.display());

    let mut config = EnhancerConfig::default();
    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    let enhancer = VocalEnhancer::new(config)?;
    let overrides = (!args.overrides.is_empty()).then_some(&args.overrides);
    let excerpt = args.dry_run.then_some(DRY_RUN_SECONDS);
    let (path, metadata) = enhancer.enhance_file_excerpt(input, output, overrides, excerpt)?;

    println!("Enhanced vocals: {}", path.display());
    println!(
        "Detected key:    {}",
        metadata.detected_key.as_deref().unwrap_or("unknown")
    );
    if let Some(pitch) = metadata.median_pitch_hz {
        println!("Median pitch:    {:.1} Hz", pitch);
    }
    if let Some(snr) = metadata.snr_db {
        println!("Estimated SNR:   {:.1} dB", snr);
    }

    Ok(())
}

/// Settings for `hitmix mix`
#[derive(Debug, Clone, Default)]
pub struct MixArgs {
    pub config: Option<PathBuf>,
    pub instrumental_gain_db: Option<f32>,
    pub vocal_gain_db: Option<f32>,
    pub no_echo: bool,
}

/// Mix an instrumental and a vocal file.
pub fn mix(instrumental: &Path, vocal: &Path, output: &Path, args: &MixArgs) -> Result<()> {
    info!(
        "Mixing {} with {}",
        instrumental.display(),
        vocal.display()
    );

    let mixer_config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?.mixing,
        None => MixerConfig::default(),
    };
    let mixer = StemMixer::new(mixer_config)?;

    let defaults = mixer.default_options();
    let options = MixOptions {
        instrumental_gain_db: args
            .instrumental_gain_db
            .unwrap_or(defaults.instrumental_gain_db),
        vocal_gain_db: args.vocal_gain_db.unwrap_or(defaults.vocal_gain_db),
        add_vocal_echo: defaults.add_vocal_echo && !args.no_echo,
    };
    let path = mixer.mix_files(instrumental, vocal, output, &options)?;

    println!("Mix saved: {}", path.display());
    Ok(())
}

/// Normalize a file to a loudness target.
pub fn master(input: &Path, output: &Path, target_lufs: f32) -> Result<()> {
    info!("Mastering {} to {} LUFS", input.display(), target_lufs);

    let mixer = StemMixer::default();
    let path = mixer.normalize_lufs_file(input, output, target_lufs)?;

    println!("Master saved: {}", path.display());
    Ok(())
}

/// Blend two vocal files.
pub fn blend(vocal_a: &Path, vocal_b: &Path, output: &Path, ratio: f32) -> Result<()> {
    info!(
        "Blending {} and {} at {:.2}",
        vocal_a.display(),
        vocal_b.display(),
        ratio
    );

    let mixer = StemMixer::default();
    let path = mixer.blend_vocal_files(vocal_a, vocal_b, output, ratio)?;

    println!("Blend saved: {}", path.display());
    Ok(())
}

/// Settings for `hitmix run`
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub instrumental: PathBuf,
    pub voice: Option<PathBuf>,
    pub vocal_mode: VocalModeArg,
    pub voice_model: Option<PathBuf>,
    pub rvc_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub story: Option<PathBuf>,
    pub lyrics: Option<PathBuf>,
}

/// Apply command-line overrides on top of the file config
pub fn run_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(mode) = args.vocal_mode.resolve() {
        config.vocal_mode = mode.to_string();
    }
    if let Some(root) = &args.rvc_root {
        config.rvc.rvc_root = Some(root.clone());
    }
    if let Some(model) = &args.voice_model {
        config.rvc.voice_model_path = Some(model.clone());
    }
    if let Some(root) = &args.output_root {
        config.output_root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Run the full pipeline and print a summary.
pub fn run(args: &RunArgs) -> Result<()> {
    let config = run_config(args)?;
    let pipeline = Pipeline::new(config)?;
    info!("Running pipeline in {} mode", pipeline.vocal_mode());

    let story = match &args.story {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => serde_json::Value::Null,
    };
    let inputs = PipelineInputs {
        instrumental: args.instrumental.clone(),
        vocal: args.voice.clone(),
        story,
        lyrics_path: args.lyrics.clone(),
    };

    let artifacts = pipeline.run(&inputs)?;

    println!("{:-<60}", "");
    println!("{}", artifacts.summary());
    println!("{:-<60}", "");
    Ok(())
}
