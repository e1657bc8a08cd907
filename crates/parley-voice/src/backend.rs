//! Seam between the adapter and a local transcription model.

use crate::error::VoiceError;

/// One span of speech as the backend reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSegment {
    pub text: String,
    pub start_secs: f32,
    pub end_secs: f32,
}

/// Per-call metadata returned alongside the segments.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionInfo {
    /// Language the model transcribed in.
    pub language: String,
    pub language_probability: Option<f32>,
    /// Overall confidence, if the backend can estimate one.
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutput {
    /// Segments in temporal order.
    pub segments: Vec<BackendSegment>,
    pub info: TranscriptionInfo,
}

/// A loaded speech recognition model.
///
/// `transcribe` is blocking CPU or accelerator work. Callers on an async
/// runtime must run it on a blocking worker.
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribes 16 kHz mono samples in `language` using beam search of
    /// width `beam_size`.
    fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
        beam_size: usize,
    ) -> Result<BackendOutput, VoiceError>;
}
