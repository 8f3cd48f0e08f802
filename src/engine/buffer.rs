//! Audio Buffer Management
//!
//! The core multichannel sample container for Hitmix. Buffers are treated as
//! values: every transform here returns a new buffer and leaves `self` alone.

use crate::error::{HitmixError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default processing sample rate (CD rate, matches the generative stems)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Full-scale bound applied by every clipping transform
pub const FULL_SCALE: f32 = 1.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Linear RMS over every sample of every channel
///
/// Returns 0.0 for empty buffers.
pub fn calculate_rms(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.num_samples();
    if total_samples == 0 {
        return 0.0;
    }

    let sum_squares: f64 = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    (sum_squares / total_samples as f64).sqrt() as f32
}

/// Largest absolute sample value across all channels
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Multichannel audio stored as one `Vec<f32>` per channel
///
/// Invariant: every channel holds the same number of frames.
///
/// # Example
/// ```
/// use hitmix::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::silence(2, 44100, 44100);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Build a buffer from per-channel data
    ///
    /// # Errors
    /// * `InvalidSampleRate` - rate is zero
    /// * `EmptyAudio` - no channels were supplied
    /// * `InvalidAudio` - channels differ in length
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(HitmixError::InvalidSampleRate { sample_rate });
        }
        let Some(first) = samples.first() else {
            return Err(HitmixError::EmptyAudio);
        };
        let frames = first.len();
        if let Some(bad) = samples.iter().find(|ch| ch.len() != frames) {
            return Err(HitmixError::InvalidAudio {
                reason: format!(
                    "channels have unequal lengths ({} vs {} frames)",
                    frames,
                    bad.len()
                ),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Single-channel convenience constructor
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Zero-filled buffer
    pub fn silence(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create a buffer from interleaved sample data
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize, sample_rate: u32) -> Result<Self> {
        if num_channels == 0 {
            return Err(HitmixError::UnsupportedFormat {
                format: "0-channel audio".to_string(),
            });
        }
        if interleaved.len() % num_channels != 0 {
            return Err(HitmixError::InvalidAudio {
                reason: format!(
                    "{} samples cannot be split evenly into {} channels",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let frames = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(frames); num_channels];
        for (i, sample) in interleaved.iter().enumerate() {
            samples[i % num_channels].push(*sample);
        }
        Self::from_channels(samples, sample_rate)
    }

    /// Convert to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let frames = self.num_samples();
        let mut result = Vec::with_capacity(frames * self.num_channels());
        for frame in 0..frames {
            for channel in &self.samples {
                result.push(channel[frame]);
            }
        }
        result
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames (samples per channel)
    pub fn num_samples(&self) -> usize {
        self.samples.first().map_or(0, |ch| ch.len())
    }

    /// True when the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Read-only view of one channel
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get a sample, or None when out of range
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples.get(channel).and_then(|ch| ch.get(index)).copied()
    }

    /// Check the buffer is usable as processing input
    ///
    /// # Errors
    /// * `InvalidSampleRate` - rate is zero
    /// * `EmptyAudio` - no channels or no frames
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(HitmixError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if self.samples.is_empty() || self.is_empty() {
            return Err(HitmixError::EmptyAudio);
        }
        let frames = self.num_samples();
        if self.samples.iter().any(|ch| ch.len() != frames) {
            return Err(HitmixError::InvalidAudio {
                reason: "channels have unequal lengths".to_string(),
                source: None,
            });
        }
        Ok(())
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Apply `f` to every sample, producing a new buffer at the same rate
    pub fn map_samples(&self, mut f: impl FnMut(f32) -> f32) -> AudioBuffer {
        AudioBuffer {
            samples: self
                .samples
                .iter()
                .map(|ch| ch.iter().map(|&s| f(s)).collect())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Scale every sample by exactly `10^(gain_db/20)`
    pub fn apply_gain(&self, gain_db: f32) -> AudioBuffer {
        let gain_linear = db_to_linear(gain_db);
        self.map_samples(|s| s * gain_linear)
    }

    /// Hard-clip every sample to [-1.0, 1.0]
    pub fn clip(&self) -> AudioBuffer {
        self.map_samples(|s| s.clamp(-FULL_SCALE, FULL_SCALE))
    }

    /// Right-pad with zeros (or truncate) every channel to `num_samples`
    pub fn fit_to_length(&self, num_samples: usize) -> AudioBuffer {
        AudioBuffer {
            samples: self
                .samples
                .iter()
                .map(|ch| {
                    let mut out = ch.clone();
                    out.resize(num_samples, 0.0);
                    out
                })
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> AudioBuffer {
        let channels = self.num_channels().max(1) as f32;
        let mono = (0..self.num_samples())
            .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() / channels)
            .collect();
        AudioBuffer {
            samples: vec![mono],
            sample_rate: self.sample_rate,
        }
    }

    /// Duplicate a mono buffer across `num_channels` channels
    ///
    /// # Errors
    /// `ChannelMismatch` when the buffer is neither mono nor already at
    /// `num_channels`.
    pub fn with_channel_count(&self, num_channels: usize) -> Result<AudioBuffer> {
        if self.num_channels() == num_channels {
            return Ok(self.clone());
        }
        if self.num_channels() != 1 {
            return Err(HitmixError::ChannelMismatch {
                left: self.num_channels(),
                right: num_channels,
            });
        }
        Ok(AudioBuffer {
            samples: vec![self.samples[0].clone(); num_channels],
            sample_rate: self.sample_rate,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Helper to create a buffer with known content
    fn create_test_buffer(samples: Vec<Vec<f32>>) -> AudioBuffer {
        AudioBuffer {
            samples,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    // ------------------------------------------------------------------------
    // Unit conversion tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_db_to_linear() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(0.1) - (-20.0)).abs() < 1e-4);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    // ------------------------------------------------------------------------
    // Construction tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_channels_rejects_zero_rate() {
        let result = AudioBuffer::from_channels(vec![vec![0.1; 4]], 0);
        assert!(matches!(
            result,
            Err(HitmixError::InvalidSampleRate { sample_rate: 0 })
        ));
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let result = AudioBuffer::from_channels(vec![vec![0.1; 4], vec![0.1; 3]], 44100);
        assert!(matches!(result, Err(HitmixError::InvalidAudio { .. })));
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(buffer.channel(1), &[5.0, 6.0, 7.0]);
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_validate_empty() {
        let buffer = create_test_buffer(vec![vec![], vec![]]);
        assert!(matches!(buffer.validate(), Err(HitmixError::EmptyAudio)));
    }

    // ------------------------------------------------------------------------
    // Transform tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_apply_gain_exact_factor() {
        let buffer = create_test_buffer(vec![vec![0.5, -0.25, 0.125]]);
        let gained = buffer.apply_gain(-6.0);
        let factor = 10.0_f32.powf(-6.0 / 20.0);
        for (orig, out) in buffer.channel(0).iter().zip(gained.channel(0)) {
            assert_eq!(*out, orig * factor);
        }
        // source untouched
        assert_eq!(buffer.channel(0), &[0.5, -0.25, 0.125]);
    }

    #[test]
    fn test_apply_gain_zero_is_identity() {
        let buffer = create_test_buffer(vec![vec![0.3, -0.7], vec![0.1, 0.9]]);
        assert_eq!(buffer.apply_gain(0.0), buffer);
    }

    #[test]
    fn test_clip_bounds() {
        let buffer = create_test_buffer(vec![vec![1.5, -2.0, 0.5]]);
        let clipped = buffer.clip();
        assert_eq!(clipped.channel(0), &[1.0, -1.0, 0.5]);
        assert!(calculate_peak(&clipped) <= 1.0);
    }

    #[test]
    fn test_fit_to_length_pads_and_truncates() {
        let buffer = create_test_buffer(vec![vec![0.1, 0.2, 0.3]]);
        assert_eq!(buffer.fit_to_length(5).channel(0), &[0.1, 0.2, 0.3, 0.0, 0.0]);
        assert_eq!(buffer.fit_to_length(2).channel(0), &[0.1, 0.2]);
    }

    #[test]
    fn test_to_mono_averages() {
        let buffer = create_test_buffer(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let mono = buffer.to_mono();
        assert_eq!(mono.num_channels(), 1);
        assert_eq!(mono.channel(0), &[0.5, 0.5]);
    }

    #[test]
    fn test_with_channel_count() {
        let mono = create_test_buffer(vec![vec![0.2, 0.4]]);
        let stereo = mono.with_channel_count(2).unwrap();
        assert_eq!(stereo.num_channels(), 2);
        assert_eq!(stereo.channel(1), &[0.2, 0.4]);

        let tri = create_test_buffer(vec![vec![0.0]; 3]);
        assert!(matches!(
            tri.with_channel_count(2),
            Err(HitmixError::ChannelMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_rms_and_peak() {
        let buffer = create_test_buffer(vec![vec![0.5, -0.5, 0.5, -0.5]]);
        assert_relative_eq!(calculate_rms(&buffer), 0.5, epsilon = 1e-6);
        assert_relative_eq!(calculate_peak(&buffer), 0.5);
    }
}
