//! Stem summing, loudness mastering and take blending

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::MixerConfig;
use crate::dsp::{apply_chain, integrated_loudness, Echo, Effect, Gain};
use crate::engine::{
    ensure_exists, load_wav, load_wav_at, resample, write_wav, AudioBuffer, WavFormat,
};
use crate::error::{HitmixError, Result};

/// Per-call mix settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixOptions {
    pub instrumental_gain_db: f32,
    pub vocal_gain_db: f32,
    pub add_vocal_echo: bool,
}

impl Default for MixOptions {
    fn default() -> Self {
        let config = MixerConfig::default();
        Self {
            instrumental_gain_db: config.instrumental_gain_db,
            vocal_gain_db: config.vocal_gain_db,
            add_vocal_echo: config.add_vocal_echo,
        }
    }
}

/// Bring two buffers to a common channel count, upmixing a mono side
fn match_channels(a: &AudioBuffer, b: &AudioBuffer) -> Result<(AudioBuffer, AudioBuffer)> {
    let (left, right) = (a.num_channels(), b.num_channels());
    let target = left.max(right);
    let mismatch = |_: HitmixError| HitmixError::ChannelMismatch { left, right };
    Ok((
        a.with_channel_count(target).map_err(mismatch)?,
        b.with_channel_count(target).map_err(mismatch)?,
    ))
}

/// Right-pad both buffers to the longer length
fn pad_to_longest(a: &AudioBuffer, b: &AudioBuffer) -> (AudioBuffer, AudioBuffer) {
    let len = a.num_samples().max(b.num_samples());
    (a.fit_to_length(len), b.fit_to_length(len))
}

/// `a * wa + b * wb` sample by sample, hard-clipped
fn weighted_sum(a: &AudioBuffer, wa: f32, b: &AudioBuffer, wb: f32) -> AudioBuffer {
    let samples = a
        .samples
        .iter()
        .zip(b.samples.iter())
        .map(|(ca, cb)| {
            ca.iter()
                .zip(cb.iter())
                .map(|(&x, &y)| (x * wa + y * wb).clamp(-1.0, 1.0))
                .collect()
        })
        .collect();
    AudioBuffer {
        samples,
        sample_rate: a.sample_rate,
    }
}

/// Gain-staged stem summing with optional vocal echo
#[derive(Debug, Clone, Default)]
pub struct StemMixer {
    config: MixerConfig,
}

impl StemMixer {
    /// Create a mixer with validated settings
    pub fn new(config: MixerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Mix options taken from the configured defaults
    pub fn default_options(&self) -> MixOptions {
        MixOptions {
            instrumental_gain_db: self.config.instrumental_gain_db,
            vocal_gain_db: self.config.vocal_gain_db,
            add_vocal_echo: self.config.add_vocal_echo,
        }
    }

    fn echo(&self) -> Echo {
        Echo::new(self.config.echo_delay_seconds, self.config.echo_decay)
    }

    fn to_mixer_rate(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        if buffer.sample_rate == self.config.sample_rate {
            return Ok(buffer.clone());
        }
        debug!(
            "Resampling stem from {}Hz to {}Hz",
            buffer.sample_rate, self.config.sample_rate
        );
        resample(buffer, self.config.sample_rate)
    }

    /// Sum an instrumental and a vocal stem
    ///
    /// Both stems are brought to the mixer rate, gain-staged, the vocal
    /// optionally echoed (and clipped), right-padded to the longer stem,
    /// summed and clipped.
    ///
    /// # Errors
    /// * `EmptyAudio` / `InvalidSampleRate` - unusable stem
    /// * `ChannelMismatch` - neither stem is mono and their counts differ
    pub fn mix(
        &self,
        instrumental: &AudioBuffer,
        vocal: &AudioBuffer,
        options: &MixOptions,
    ) -> Result<AudioBuffer> {
        instrumental.validate()?;
        vocal.validate()?;

        let inst = self.to_mixer_rate(instrumental)?;
        let vox = self.to_mixer_rate(vocal)?;
        let (inst, vox) = match_channels(&inst, &vox)?;

        let inst = Gain::new(options.instrumental_gain_db).apply(&inst);

        let vocal_gain = Gain::new(options.vocal_gain_db);
        let echo = self.echo();
        let mut vocal_bus: Vec<&dyn Effect> = vec![&vocal_gain];
        if options.add_vocal_echo {
            vocal_bus.push(&echo);
        }
        let vox = apply_chain(&vocal_bus, &vox);

        let (inst, vox) = pad_to_longest(&inst, &vox);
        let mixed = weighted_sum(&inst, 1.0, &vox, 1.0);

        info!(
            "Mixed {} frames x {} channels at {}Hz",
            mixed.num_samples(),
            mixed.num_channels(),
            mixed.sample_rate
        );
        Ok(mixed)
    }

    /// Scale `audio` so its integrated loudness lands on `target_lufs`
    ///
    /// Audio whose loudness cannot be measured (silence, under 400 ms) is
    /// returned clipped but otherwise unchanged.
    pub fn normalize_lufs(&self, audio: &AudioBuffer, target_lufs: f32) -> Result<AudioBuffer> {
        audio.validate()?;
        if !target_lufs.is_finite() {
            return Err(HitmixError::invalid_config(
                "target_lufs",
                format!("{} is not finite", target_lufs),
            ));
        }

        let Some(measured) = integrated_loudness(audio)? else {
            warn!("Loudness is unmeasurable (silent or too short); skipping normalization");
            return Ok(audio.clip());
        };

        let gain_db = (target_lufs as f64 - measured) as f32;
        info!(
            "Normalizing loudness: {:.2} LUFS -> {:.2} LUFS ({:+.2} dB)",
            measured, target_lufs, gain_db
        );
        Ok(audio.apply_gain(gain_db).clip())
    }

    /// Blend two takes: `a * (1 - ratio) + b * ratio`, clipped
    ///
    /// `b` is resampled to `a`'s rate when they differ; the shorter take is
    /// right-padded with silence.
    ///
    /// # Errors
    /// `InvalidConfig` when `ratio` is outside [0, 1].
    pub fn blend_vocals(
        &self,
        a: &AudioBuffer,
        b: &AudioBuffer,
        ratio: f32,
    ) -> Result<AudioBuffer> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(HitmixError::invalid_config(
                "blend_ratio",
                format!("{} is outside [0, 1]", ratio),
            ));
        }
        a.validate()?;
        b.validate()?;

        let b = if b.sample_rate != a.sample_rate {
            resample(b, a.sample_rate)?
        } else {
            b.clone()
        };
        let (a, b) = match_channels(a, &b)?;
        let (a, b) = pad_to_longest(&a, &b);

        debug!("Blending vocal takes at ratio {:.2}", ratio);
        Ok(weighted_sum(&a, 1.0 - ratio, &b, ratio))
    }

    // ------------------------------------------------------------------------
    // File variants: inputs are checked before anything is computed and the
    // output is written only once the full result exists.
    // ------------------------------------------------------------------------

    pub fn mix_files(
        &self,
        instrumental_path: &Path,
        vocal_path: &Path,
        output_path: &Path,
        options: &MixOptions,
    ) -> Result<PathBuf> {
        ensure_exists(instrumental_path)?;
        ensure_exists(vocal_path)?;
        let inst = load_wav_at(instrumental_path, self.config.sample_rate)?;
        let vox = load_wav_at(vocal_path, self.config.sample_rate)?;
        let mixed = self.mix(&inst, &vox, options)?;
        write_wav(&mixed, output_path, WavFormat::default())
    }

    pub fn normalize_lufs_file(
        &self,
        audio_path: &Path,
        output_path: &Path,
        target_lufs: f32,
    ) -> Result<PathBuf> {
        let audio = load_wav(audio_path)?;
        let normalized = self.normalize_lufs(&audio, target_lufs)?;
        write_wav(&normalized, output_path, WavFormat::default())
    }

    pub fn blend_vocal_files(
        &self,
        vocal_a_path: &Path,
        vocal_b_path: &Path,
        output_path: &Path,
        ratio: f32,
    ) -> Result<PathBuf> {
        ensure_exists(vocal_a_path)?;
        ensure_exists(vocal_b_path)?;
        let a = load_wav(vocal_a_path)?;
        let b = load_wav(vocal_b_path)?;
        let blended = self.blend_vocals(&a, &b, ratio)?;
        write_wav(&blended, output_path, WavFormat::default())
    }
}
