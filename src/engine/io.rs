//! Audio file I/O for Hitmix
//!
//! WAV in, WAV out. Any channel count and bit depth `hound` understands is
//! accepted on load; writes go to a temporary sibling file that is renamed
//! into place only once the whole file has been encoded.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::engine::buffer::AudioBuffer;
use crate::engine::resample::resample;
use crate::error::{HitmixError, Result};

/// WAV encoding used when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Bit depth: 16, 24 (integer PCM) or 32 (float) (default: 24)
    pub bit_depth: u16,
}

impl Default for WavFormat {
    fn default() -> Self {
        WavFormat { bit_depth: 24 }
    }
}

impl WavFormat {
    /// Create a format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        WavFormat { bit_depth }
    }

    /// 16-bit integer PCM
    pub fn pcm16() -> Self {
        WavFormat { bit_depth: 16 }
    }

    /// 32-bit IEEE float
    pub fn float32() -> Self {
        WavFormat { bit_depth: 32 }
    }
}

/// Fail with `FileNotFound` unless `path` names an existing file
pub fn ensure_exists(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(HitmixError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        }),
        Err(e) => Err(HitmixError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        }),
    }
}

/// Load a WAV file at its native sample rate and channel count
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the bit depth cannot be decoded
/// * `InvalidSampleRate` - If the header declares a zero rate
/// * `EmptyAudio` - If the file holds no frames
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    ensure_exists(path)?;

    let reader = WavReader::open(path).map_err(|e| HitmixError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if spec.sample_rate == 0 {
        return Err(HitmixError::InvalidSampleRate {
            sample_rate: spec.sample_rate,
        });
    }
    if channels == 0 {
        return Err(HitmixError::UnsupportedFormat {
            format: "0-channel audio".to_string(),
        });
    }

    let samples_f32 = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples_f32.len() < channels {
        return Err(HitmixError::EmptyAudio);
    }

    // Drop a trailing partial frame rather than rejecting the file.
    let whole = samples_f32.len() - samples_f32.len() % channels;
    let buffer = AudioBuffer::from_interleaved(&samples_f32[..whole], channels, spec.sample_rate)?;

    debug!(
        "Loaded {}: {} ch, {} Hz, {} frames",
        path.display(),
        channels,
        spec.sample_rate,
        buffer.num_samples()
    );

    Ok(buffer)
}

/// Load a WAV file and resample it to `sample_rate`
pub fn load_wav_at(path: &Path, sample_rate: u32) -> Result<AudioBuffer> {
    let buffer = load_wav(path)?;
    resample(&buffer, sample_rate)
}

/// Write a buffer to a WAV file
///
/// Parent directories are created as needed. The data is encoded to
/// `<path>.partial` and renamed over `path` after the encoder finalizes, so a
/// failed write never leaves a truncated file under the target name.
pub fn write_wav(buffer: &AudioBuffer, path: &Path, format: WavFormat) -> Result<PathBuf> {
    buffer.validate()?;

    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(HitmixError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            });
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let partial = partial_path(path);
    let result = encode(buffer, &partial, spec);
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, path)?;

    debug!(
        "Wrote {} ({} frames, {}-bit)",
        path.display(),
        buffer.num_samples(),
        format.bit_depth
    );

    Ok(path.to_path_buf())
}

/// Write a JSON document next to an audio artifact, atomically
pub fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let partial = partial_path(path);
    fs::write(&partial, json)?;
    fs::rename(&partial, path)?;
    Ok(path.to_path_buf())
}

/// Generate a mono sine wave
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `amplitude` - Peak amplitude
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let data = (0..num_samples)
        .map(|i| amplitude * (angular_freq * i as f32).sin())
        .collect();

    AudioBuffer {
        samples: vec![data],
        sample_rate,
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn hound_io_error(e: hound::Error) -> HitmixError {
    match e {
        hound::Error::IoError(io) => HitmixError::Io(io),
        other => HitmixError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

fn encode(buffer: &AudioBuffer, path: &Path, spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, spec).map_err(hound_io_error)?;
    let interleaved = buffer.to_interleaved();

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(hound_io_error)?;
            }
        }
        (SampleFormat::Int, _) => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(hound_io_error)?;
            }
        }
        (SampleFormat::Float, _) => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(hound_io_error)?;
            }
        }
    }

    writer.finalize().map_err(hound_io_error)
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |bits: u16| {
        move |e: hound::Error| HitmixError::InvalidAudio {
            reason: format!("Failed to read {}-bit samples: {}", bits, e),
            source: Some(Box::new(e)),
        }
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(bits_per_sample)),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(HitmixError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            if bits_per_sample == 16 {
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(invalid(bits_per_sample))
            } else {
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (v as f64 / scale as f64) as f32))
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(invalid(bits_per_sample))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
