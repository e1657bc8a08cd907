//! Captured audio handed to the transcription adapter.

use std::time::Duration;

/// Bytes per sample of signed 16-bit PCM.
pub const PCM16_BYTES_PER_SAMPLE: usize = 2;

/// A discrete unit of captured audio.
///
/// The payload is interleaved little-endian signed 16-bit PCM. A chunk is
/// immutable once produced; the adapter only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    data: Vec<u8>,
    sample_rate: u32,
    num_channels: u16,
    duration: Duration,
}

impl AudioChunk {
    /// Wraps raw PCM16 bytes. The nominal duration is derived from the number
    /// of complete frames and the sample rate.
    pub fn new(data: Vec<u8>, sample_rate: u32, num_channels: u16) -> Self {
        let duration = nominal_duration(data.len(), sample_rate, num_channels);
        Self {
            data,
            sample_rate,
            num_channels,
            duration,
        }
    }

    /// Builds a chunk from interleaved `i16` samples.
    pub fn from_pcm16(samples: &[i16], sample_rate: u32, num_channels: u16) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(data, sample_rate, num_channels)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of complete frames (one sample per channel) in the payload.
    pub fn frames(&self) -> usize {
        if self.num_channels == 0 {
            return 0;
        }
        self.data.len() / PCM16_BYTES_PER_SAMPLE / self.num_channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

fn nominal_duration(len_bytes: usize, sample_rate: u32, num_channels: u16) -> Duration {
    if sample_rate == 0 || num_channels == 0 {
        return Duration::ZERO;
    }
    let frames = len_bytes / PCM16_BYTES_PER_SAMPLE / num_channels as usize;
    Duration::from_secs_f64(frames as f64 / sample_rate as f64)
}
