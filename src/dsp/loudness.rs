//! Integrated loudness (ITU-R BS.1770 / EBU R128)

use ebur128::{EbuR128, Mode};

use crate::engine::AudioBuffer;
use crate::error::{HitmixError, Result};

/// Default mastering target in LUFS
pub const DEFAULT_TARGET_LUFS: f32 = -9.5;

/// Measure gated integrated loudness in LUFS
///
/// Returns `Ok(None)` when the programme has no measurable loudness: digital
/// silence, or less than one 400 ms gating block of audio.
///
/// # Errors
/// `ProcessingError` if the meter rejects the channel layout or sample rate.
pub fn integrated_loudness(buffer: &AudioBuffer) -> Result<Option<f64>> {
    if buffer.is_empty() {
        return Ok(None);
    }

    let meter_error = |e: ebur128::Error| HitmixError::ProcessingError {
        reason: format!("loudness meter: {:?}", e),
    };

    let mut meter = EbuR128::new(buffer.num_channels() as u32, buffer.sample_rate, Mode::I)
        .map_err(meter_error)?;
    let planes: Vec<&[f32]> = buffer.samples.iter().map(|ch| ch.as_slice()).collect();
    meter.add_frames_planar_f32(&planes).map_err(meter_error)?;

    let lufs = meter.loudness_global().map_err(meter_error)?;
    Ok(lufs.is_finite().then_some(lufs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    #[test]
    fn test_full_scale_sine_reference() {
        // a 0 dBFS 997 Hz sine in one channel reads about -3.0 LUFS
        let tone = generate_test_tone(997.0, 1.0, 3.0, 48000);
        let lufs = integrated_loudness(&tone).unwrap().unwrap();
        assert!((lufs + 3.0).abs() < 0.2, "got {}", lufs);
    }

    #[test]
    fn test_gain_shifts_loudness_exactly() {
        let tone = generate_test_tone(440.0, 0.3, 2.0, 44100);
        let before = integrated_loudness(&tone).unwrap().unwrap();
        let after = integrated_loudness(&tone.apply_gain(-6.0)).unwrap().unwrap();
        assert!((before - after - 6.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_is_unmeasurable() {
        let silent = AudioBuffer::silence(2, 44100, 44100);
        assert_eq!(integrated_loudness(&silent).unwrap(), None);
    }

    #[test]
    fn test_short_block_is_unmeasurable() {
        let blip = generate_test_tone(440.0, 0.5, 0.1, 44100);
        assert_eq!(integrated_loudness(&blip).unwrap(), None);
    }
}
