//! CLI Module
//!
//! Command-line interface for the Hitmix engine.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::VocalMode;

/// Hitmix - vocal enhancement, stem mixing and loudness mastering
#[derive(Parser, Debug)]
#[command(name = "hitmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--vocal-mode` values; `auto` keeps whatever the config file says
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VocalModeArg {
    #[default]
    Auto,
    Raw,
    Enhanced,
    Rvc,
}

impl VocalModeArg {
    pub fn resolve(self) -> Option<VocalMode> {
        match self {
            VocalModeArg::Auto => None,
            VocalModeArg::Raw => Some(VocalMode::Raw),
            VocalModeArg::Enhanced => Some(VocalMode::Enhanced),
            VocalModeArg::Rvc => Some(VocalMode::Rvc),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enhance a dry vocal take (writes the WAV plus a JSON side-car)
    #[command(name = "enhance")]
    Enhance {
        /// Dry vocal WAV
        input: PathBuf,

        /// Enhanced vocal WAV
        output: PathBuf,

        /// Processing sample rate
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Spectral gate depth in dB
        #[arg(long)]
        denoise_db: Option<f32>,

        /// Doubler wet level (0 disables)
        #[arg(long)]
        doubler_mix: Option<f32>,

        /// Formant shift request (not implemented, reported as not applied)
        #[arg(long)]
        formant_shift: Option<f32>,

        /// Pitch correction request (not implemented, reported as not applied)
        #[arg(long)]
        pitch_correction: bool,

        /// Process only the first 5 seconds
        #[arg(long)]
        dry_run: bool,
    },

    /// Sum an instrumental and a vocal stem
    #[command(name = "mix")]
    Mix {
        /// Instrumental WAV
        instrumental: PathBuf,

        /// Vocal WAV
        vocal: PathBuf,

        /// Output WAV
        output: PathBuf,

        /// Pipeline config file (only its `mixing` section is used)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Instrumental gain in dB
        #[arg(long, allow_hyphen_values = true)]
        instrumental_gain_db: Option<f32>,

        /// Vocal gain in dB
        #[arg(long, allow_hyphen_values = true)]
        vocal_gain_db: Option<f32>,

        /// Skip the vocal echo
        #[arg(long)]
        no_echo: bool,
    },

    /// Normalize a mix to a loudness target
    #[command(name = "master")]
    Master {
        /// Input WAV
        input: PathBuf,

        /// Output WAV
        output: PathBuf,

        /// Integrated loudness target in LUFS
        #[arg(long, default_value_t = -9.5, allow_hyphen_values = true)]
        target_lufs: f32,
    },

    /// Blend two vocal takes
    #[command(name = "blend")]
    Blend {
        /// First take (weight 1 - ratio)
        vocal_a: PathBuf,

        /// Second take (weight ratio)
        vocal_b: PathBuf,

        /// Output WAV
        output: PathBuf,

        /// Weight of the second take, 0..=1
        #[arg(long, default_value_t = 0.7)]
        ratio: f32,
    },

    /// Run the full vocal, mix and master pipeline
    #[command(name = "run")]
    Run {
        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Instrumental WAV
        #[arg(long)]
        instrumental: PathBuf,

        /// Dry vocal WAV (defaults to <output_root>/dry_vocals.wav)
        #[arg(long)]
        voice: Option<PathBuf>,

        /// Vocal path: auto uses the config value
        #[arg(long, value_enum, default_value_t = VocalModeArg::Auto)]
        vocal_mode: VocalModeArg,

        /// Voice model to install into the RVC checkout
        #[arg(long)]
        voice_model: Option<PathBuf>,

        /// RVC-WebUI checkout; enables voice conversion
        #[arg(long)]
        rvc_root: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_root: Option<PathBuf>,

        /// Story JSON produced upstream, carried into the report
        #[arg(long)]
        story: Option<PathBuf>,

        /// Lyrics file produced upstream, carried into the report
        #[arg(long)]
        lyrics: Option<PathBuf>,
    },
}
