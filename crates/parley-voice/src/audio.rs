//! PCM conversion and resampling ahead of inference.
//!
//! The model expects mono `f32` samples in `[-1.0, 1.0]` at 16 kHz. Chunks in
//! any other shape are normalized best-effort rather than rejected.

use crate::error::VoiceError;
use parley_types::AudioChunk;
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

/// Sample rate the transcription model consumes.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Converts mono `f32` audio between sample rates.
pub trait Resampler: Send + Sync {
    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32)
        -> Result<Vec<f32>, VoiceError>;
}

/// Windowed-sinc resampler over the whole buffer.
///
/// rubato starts `SincFixedIn` with its filter already centered on the first
/// input sample, so output is time-aligned with the input. It is trimmed (or
/// zero-padded) to exactly [`expected_resampled_len`] samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SincResampler;

impl Resampler for SincResampler {
    fn resample(
        &self,
        samples: &[f32],
        from_rate: u32,
        to_rate: u32,
    ) -> Result<Vec<f32>, VoiceError> {
        if from_rate == 0 || to_rate == 0 {
            return Err(VoiceError::Audio(format!(
                "cannot resample from {} Hz to {} Hz",
                from_rate, to_rate
            )));
        }
        if from_rate == to_rate || samples.is_empty() {
            return Ok(samples.to_vec());
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let mut resampler = SincFixedIn::<f32>::new(
            to_rate as f64 / from_rate as f64,
            2.0,
            params,
            samples.len(),
            1,
        )
        .map_err(|e| VoiceError::Audio(format!("failed to create resampler: {}", e)))?;

        let input = vec![samples.to_vec()];
        let mut output = resampler
            .process(&input, None)
            .map_err(|e| VoiceError::Audio(format!("resampling failed: {}", e)))?
            .into_iter()
            .next()
            .unwrap_or_default();

        // Flush the filter tail so the last input samples reach the output.
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| VoiceError::Audio(format!("resampling flush failed: {}", e)))?;
        if let Some(channel) = tail.into_iter().next() {
            output.extend(channel);
        }

        let expected = expected_resampled_len(samples.len(), from_rate, to_rate);
        let mut aligned: Vec<f32> = output.into_iter().take(expected).collect();
        aligned.resize(expected, 0.0);
        Ok(aligned)
    }
}

/// Number of samples `len` input samples become after resampling.
pub fn expected_resampled_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    if from_rate == 0 {
        return 0;
    }
    (len as f64 * to_rate as f64 / from_rate as f64).round() as usize
}

/// Decodes interleaved little-endian `i16` samples. A trailing odd byte is dropped.
pub fn decode_pcm16(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Keeps the first channel of every complete frame.
///
/// This is stride selection, not averaging: `floor(len / channels)` samples
/// come out.
pub fn downmix_first_channel(samples: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples.chunks_exact(channels).map(|frame| frame[0]).collect()
}

/// Scales PCM16 into `[-1.0, 1.0]`.
pub fn pcm16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Whether [`prepare_samples`] will hand this chunk to a resampler.
///
/// Empty chunks and chunks with a zero sample rate never are.
pub fn needs_resampling(chunk: &AudioChunk) -> bool {
    chunk.sample_rate() != 0 && chunk.sample_rate() != TARGET_SAMPLE_RATE && !chunk.is_empty()
}

/// Runs the full conversion: decode, downmix, normalize, resample to 16 kHz.
///
/// The resampler is not called for 16 kHz input.
pub fn prepare_samples(
    chunk: &AudioChunk,
    resampler: &dyn Resampler,
) -> Result<Vec<f32>, VoiceError> {
    if chunk.num_channels() == 0 {
        return Err(VoiceError::Audio("chunk declares zero channels".to_string()));
    }
    if chunk.sample_rate() == 0 {
        return Err(VoiceError::Audio(
            "chunk declares a zero sample rate".to_string(),
        ));
    }

    let pcm = decode_pcm16(chunk.data());
    let mono = downmix_first_channel(&pcm, chunk.num_channels() as usize);
    let samples = pcm16_to_f32(&mono);

    if !needs_resampling(chunk) {
        return Ok(samples);
    }
    resampler.resample(&samples, chunk.sample_rate(), TARGET_SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_drops_trailing_odd_byte() {
        let pcm = decode_pcm16(&[0x00, 0x80, 0xFF, 0x7F, 0x01]);
        assert_eq!(pcm, vec![i16::MIN, i16::MAX]);
    }

    #[test]
    fn downmix_selects_first_channel_of_complete_frames() {
        let interleaved = [1, 10, 2, 20, 3, 30, 4];
        assert_eq!(downmix_first_channel(&interleaved, 2), vec![1, 2, 3]);
        assert_eq!(downmix_first_channel(&interleaved, 3), vec![1, 20]);
        assert_eq!(downmix_first_channel(&interleaved, 1), interleaved.to_vec());
    }

    #[test]
    fn normalization_stays_in_unit_range() {
        let out = pcm16_to_f32(&[i16::MIN, 0, i16::MAX]);
        assert_eq!(out[0], -1.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2] < 1.0 && out[2] > 0.999);
    }

    #[test]
    fn expected_len_rounds() {
        assert_eq!(expected_resampled_len(48_000, 48_000, 16_000), 16_000);
        assert_eq!(expected_resampled_len(441, 44_100, 16_000), 160);
        assert_eq!(expected_resampled_len(1_000, 22_050, 16_000), 726);
        assert_eq!(expected_resampled_len(10, 0, 16_000), 0);
    }

    #[test]
    fn sinc_resampler_produces_expected_length() {
        let input: Vec<f32> = (0..4_800)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        let out = SincResampler
            .resample(&input, 48_000, 16_000)
            .expect("resample");
        assert_eq!(out.len(), 1_600);
        assert!(out.iter().all(|s| s.abs() <= 1.0));

        let out = SincResampler
            .resample(&input[..2_205], 22_050, 16_000)
            .expect("resample");
        assert_eq!(out.len(), expected_resampled_len(2_205, 22_050, 16_000));
    }

    fn peak_index(samples: &[f32]) -> usize {
        samples
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, s)| {
                if s.abs() > best.1 {
                    (i, s.abs())
                } else {
                    best
                }
            })
            .0
    }

    #[test]
    fn sinc_resampler_keeps_impulse_in_place() {
        for rate in [48_000u32, 44_100, 22_050, 8_000] {
            let mut input = vec![0.0f32; rate as usize];
            input[rate as usize / 2] = 1.0;

            let out = SincResampler
                .resample(&input, rate, TARGET_SAMPLE_RATE)
                .expect("resample");
            assert_eq!(out.len(), 16_000);

            let peak = peak_index(&out) as i64;
            assert!(
                (peak - 8_000).abs() <= 1,
                "rate {}: impulse at 0.5 s landed at sample {}",
                rate,
                peak
            );
        }
    }

    #[test]
    fn upsampled_tail_carries_signal() {
        let input: Vec<f32> = (0..8_000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8_000.0).sin() * 0.5)
            .collect();
        let out = SincResampler
            .resample(&input, 8_000, TARGET_SAMPLE_RATE)
            .expect("resample");
        assert_eq!(out.len(), 16_000);

        let tail_max = out[out.len() - 50..]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_max > 0.05, "tail max {}", tail_max);
    }

    #[test]
    fn sinc_resampler_is_identity_at_same_rate() {
        let input = vec![0.25f32; 100];
        let out = SincResampler.resample(&input, 16_000, 16_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn sinc_resampler_rejects_zero_rate() {
        let err = SincResampler.resample(&[0.0; 4], 0, 16_000).unwrap_err();
        assert!(matches!(err, VoiceError::Audio(_)));
    }

    #[test]
    fn only_non_empty_foreign_rate_chunks_need_resampling() {
        assert!(needs_resampling(&AudioChunk::from_pcm16(&[1; 48], 48_000, 1)));
        assert!(!needs_resampling(&AudioChunk::from_pcm16(&[1; 16], 16_000, 1)));
        assert!(!needs_resampling(&AudioChunk::from_pcm16(&[1; 16], 0, 1)));
        assert!(!needs_resampling(&AudioChunk::new(Vec::new(), 48_000, 1)));
        assert!(!needs_resampling(&AudioChunk::new(vec![0x01], 8_000, 1)));
    }

    #[test]
    fn prepare_rejects_zero_channels() {
        let chunk = AudioChunk::new(vec![0; 8], 16_000, 0);
        assert!(prepare_samples(&chunk, &SincResampler).is_err());
    }

    #[test]
    fn prepare_passes_16khz_mono_through() {
        let chunk = AudioChunk::from_pcm16(&[0, 16_384, -16_384], 16_000, 1);
        let out = prepare_samples(&chunk, &SincResampler).unwrap();
        assert_eq!(out, vec![0.0, 0.5, -0.5]);
    }
}
