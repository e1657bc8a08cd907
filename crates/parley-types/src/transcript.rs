//! Transcription results and capability declarations.
//!
//! A `TranscriptionResult` is either a complete transcript or an explicit
//! failure. There is no interim state: the adapter is batch-only.

use serde::{Deserialize, Serialize};

/// Confidence reported when the backend does not supply one.
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

/// Static capabilities a speech-to-text implementation declares to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SttCapabilities {
    /// Whether partial audio may be pushed incrementally.
    pub streaming: bool,
    /// Whether interim (non-final) text is ever produced.
    pub interim_results: bool,
}

impl SttCapabilities {
    /// One chunk in, one final result out.
    pub const BATCH: Self = Self {
        streaming: false,
        interim_results: false,
    };
}

/// One contiguous span of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start offset from the beginning of the chunk, in milliseconds.
    pub start_ms: u64,
    /// End offset from the beginning of the chunk, in milliseconds.
    pub end_ms: u64,
    /// Language the backend reported for this span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptSegment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A complete transcript of one audio chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Segment texts concatenated in backend order, surrounding whitespace trimmed.
    pub text: String,
    /// Language the transcription was performed in.
    pub language: String,
    pub confidence: f32,
    /// Segments in temporal order, as produced by the backend.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Assembles a transcript from ordered segments.
    pub fn from_segments(
        language: impl Into<String>,
        confidence: f32,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<String>()
            .trim()
            .to_string();
        Self {
            text,
            language: language.into(),
            confidence,
            segments,
        }
    }

    /// A transcript with no speech in it.
    pub fn empty(language: impl Into<String>) -> Self {
        Self::from_segments(language, DEFAULT_CONFIDENCE, Vec::new())
    }
}

/// Outcome of a single `recognize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscriptionResult {
    /// Transcription completed. The text may be empty if no speech was found.
    Success(Transcript),
    /// Transcription failed; `message` is meant for operators, not end users.
    Failure { language: String, message: String },
}

impl TranscriptionResult {
    pub fn failure(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            language: language.into(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Recognized text, or the empty string for a failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(t) => &t.text,
            Self::Failure { .. } => "",
        }
    }

    pub fn language(&self) -> &str {
        match self {
            Self::Success(t) => &t.language,
            Self::Failure { language, .. } => language,
        }
    }

    /// Segments of a successful transcript; failures carry none.
    pub fn segments(&self) -> &[TranscriptSegment] {
        match self {
            Self::Success(t) => &t.segments,
            Self::Failure { .. } => &[],
        }
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        match self {
            Self::Success(t) => Some(t),
            Self::Failure { .. } => None,
        }
    }
}
