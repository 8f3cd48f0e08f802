//! Hitmix CLI
//!
//! Command-line interface for the Hitmix vocal and mix engine.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use hitmix::cli::commands::{self, EnhanceArgs, MixArgs, RunArgs};
use hitmix::cli::{Cli, Commands};
use hitmix::config::EnhancerOverrides;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Hitmix v{}", env!("CARGO_PKG_VERSION"));

    handle_command(cli.command)
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Enhance {
            input,
            output,
            sample_rate,
            denoise_db,
            doubler_mix,
            formant_shift,
            pitch_correction,
            dry_run,
        } => {
            let args = EnhanceArgs {
                sample_rate,
                overrides: EnhancerOverrides {
                    denoise_db,
                    formant_shift,
                    doubler_mix,
                    pitch_correction: pitch_correction.then_some(true),
                },
                dry_run,
            };
            commands::enhance(&input, &output, &args)
                .with_context(|| format!("enhancing {}", input.display()))
        }
        Commands::Mix {
            instrumental,
            vocal,
            output,
            config,
            instrumental_gain_db,
            vocal_gain_db,
            no_echo,
        } => {
            let args = MixArgs {
                config,
                instrumental_gain_db,
                vocal_gain_db,
                no_echo,
            };
            commands::mix(&instrumental, &vocal, &output, &args)
                .with_context(|| format!("mixing into {}", output.display()))
        }
        Commands::Master {
            input,
            output,
            target_lufs,
        } => commands::master(&input, &output, target_lufs)
            .with_context(|| format!("mastering {}", input.display())),
        Commands::Blend {
            vocal_a,
            vocal_b,
            output,
            ratio,
        } => commands::blend(&vocal_a, &vocal_b, &output, ratio)
            .with_context(|| format!("blending into {}", output.display())),
        Commands::Run {
            config,
            instrumental,
            voice,
            vocal_mode,
            voice_model,
            rvc_root,
            output_root,
            story,
            lyrics,
        } => {
            let args = RunArgs {
                config,
                instrumental,
                voice,
                vocal_mode,
                voice_model,
                rvc_root,
                output_root,
                story,
                lyrics,
            };
            commands::run(&args).context("pipeline run failed")
        }
    }
}
