//! Translation of transcription results into the host framework's event shape.
//!
//! Hosts receive speech events, each carrying a list of alternatives. This
//! module is the only place that shape is built; adopting a different host
//! means changing [`SpeechEvent::from_result`] and nothing else.

use parley_types::{TranscriptSegment, TranscriptionResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEventKind {
    FinalTranscript,
    Error,
}

/// One hypothesis for what was said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAlternative {
    pub text: String,
    pub language: String,
    pub confidence: f32,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechEvent {
    #[serde(rename = "type")]
    pub kind: SpeechEventKind,
    pub alternatives: Vec<SpeechAlternative>,
}

impl SpeechEvent {
    /// Maps a result to exactly one event with exactly one alternative.
    ///
    /// A failure becomes an `Error` event whose alternative text is the
    /// failure message, with zero confidence and no segments.
    pub fn from_result(result: TranscriptionResult) -> Self {
        match result {
            TranscriptionResult::Success(t) => Self {
                kind: SpeechEventKind::FinalTranscript,
                alternatives: vec![SpeechAlternative {
                    text: t.text,
                    language: t.language,
                    confidence: t.confidence,
                    segments: t.segments,
                }],
            },
            TranscriptionResult::Failure { language, message } => Self {
                kind: SpeechEventKind::Error,
                alternatives: vec![SpeechAlternative {
                    text: message,
                    language,
                    confidence: 0.0,
                    segments: Vec::new(),
                }],
            },
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind == SpeechEventKind::FinalTranscript
    }

    /// Text of the first alternative, if any.
    pub fn best_text(&self) -> Option<&str> {
        self.alternatives.first().map(|a| a.text.as_str())
    }
}

impl From<TranscriptionResult> for SpeechEvent {
    fn from(result: TranscriptionResult) -> Self {
        Self::from_result(result)
    }
}
