//! Sample-rate conversion
//!
//! Stems arrive at whatever rate the generator or the singer's interface
//! produced. [`resample`] brings them to the processing rate with a
//! band-limited FFT resampler; [`resample_linear`] is the cheap interpolator
//! used inside the pitch shifter where the ratio is a few cents from 1.0.

use log::debug;
use rubato::{FftFixedInOut, Resampler};

use crate::engine::buffer::AudioBuffer;
use crate::error::{HitmixError, Result};

/// Input chunk size requested from the FFT resampler
const RESAMPLE_CHUNK: usize = 1024;

/// Number of frames a buffer of `frames` at `source_rate` occupies at `target_rate`
pub fn resampled_len(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    ((frames as f64) * target_rate as f64 / source_rate as f64).round() as usize
}

/// Resample a buffer to `target_rate`
///
/// Returns a clone when the rates already match. The resampler's output
/// delay is removed, so a frame at time `t` in the input stays at time `t`
/// in the output. The output length is always `round(frames * target /
/// source)` so later padding logic sees deterministic sizes.
///
/// # Errors
/// * `InvalidSampleRate` - either rate is zero
/// * `ProcessingError` - the resampler could not be built or run
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if target_rate == 0 {
        return Err(HitmixError::InvalidSampleRate {
            sample_rate: target_rate,
        });
    }
    if buffer.sample_rate == 0 {
        return Err(HitmixError::InvalidSampleRate {
            sample_rate: buffer.sample_rate,
        });
    }
    if buffer.sample_rate == target_rate {
        return Ok(buffer.clone());
    }

    let channels = buffer.num_channels();
    let frames = buffer.num_samples();
    let expected = resampled_len(frames, buffer.sample_rate, target_rate);
    debug!(
        "Resampling {} frames x {} channels: {} Hz -> {} Hz",
        frames, channels, buffer.sample_rate, target_rate
    );

    if channels == 0 || frames == 0 {
        return Ok(AudioBuffer::silence(channels, 0, target_rate));
    }

    let mut resampler = FftFixedInOut::<f32>::new(
        buffer.sample_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        channels,
    )
    .map_err(|e| HitmixError::ProcessingError {
        reason: format!("failed to build resampler: {}", e),
    })?;

    let chunk_size = resampler.input_frames_next();
    let delay = resampler.output_delay();
    let needed = delay + expected;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(needed + chunk_size); channels];

    // Past the end of the input, zero chunks flush the filter until the
    // delayed tail has come out.
    let mut pos = 0;
    while output[0].len() < needed {
        let chunk: Vec<Vec<f32>> = buffer
            .samples
            .iter()
            .map(|ch| {
                let mut v = if pos < ch.len() {
                    ch[pos..(pos + chunk_size).min(ch.len())].to_vec()
                } else {
                    Vec::new()
                };
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();

        let resampled = resampler
            .process(&chunk, None)
            .map_err(|e| HitmixError::ProcessingError {
                reason: format!("resampling failed: {}", e),
            })?;

        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(data);
        }
        pos += chunk_size;
    }

    for ch in output.iter_mut() {
        ch.drain(..delay.min(ch.len()));
        ch.resize(expected, 0.0);
    }

    AudioBuffer::from_channels(output, target_rate)
}

/// Linear interpolation resampling by `ratio` (output/input length)
///
/// Linear interpolation aliases on large downsampling ratios; only use it for
/// ratios close to 1.0.
pub fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() || ratio <= 0.0 {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).round().max(1.0) as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}
