use crate::event::SpeechEvent;
use crate::stt::SpeechToText;
use crate::tts::NullSynthesizer;
use parley_types::{AudioChunk, TranscriptionResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default capacity for the per-session transcription broadcast channel.
const DEFAULT_TRANSCRIPTION_BROADCAST_CAPACITY: usize = 256;

/// Emitted when a session hears and transcribes speech.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionEvent {
    pub session: String,
    pub speaker: String,
    pub text: String,
    pub language: String,
}

/// Wires a recognizer and a synthesizer into one voice session.
///
/// Turn-taking, VAD and language-model logic belong to the host; the session
/// only turns heard audio into speech events and fans final text out to
/// subscribers.
pub struct VoiceSession {
    name: String,
    stt: Arc<dyn SpeechToText>,
    tts: NullSynthesizer,
    transcription_tx: broadcast::Sender<TranscriptionEvent>,
    closed: AtomicBool,
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("name", &self.name)
            .field("stt", &self.stt.capabilities())
            .field("tts", &self.tts)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl VoiceSession {
    pub fn new(
        name: impl Into<String>,
        stt: Arc<dyn SpeechToText>,
        tts: NullSynthesizer,
    ) -> Self {
        let name = name.into();
        let (tx, _) = broadcast::channel(DEFAULT_TRANSCRIPTION_BROADCAST_CAPACITY);
        info!(session = %name, capabilities = ?stt.capabilities(), "voice session started");
        Self {
            name,
            stt,
            tts,
            transcription_tx: tx,
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tts(&self) -> &NullSynthesizer {
        &self.tts
    }

    /// Transcribes audio heard from `speaker`.
    ///
    /// Non-empty final transcripts are broadcast to subscribers. The mapped
    /// event is returned either way, including for failures.
    pub async fn hear(&self, chunk: &AudioChunk, speaker: &str) -> SpeechEvent {
        if self.closed.load(Ordering::Acquire) {
            return SpeechEvent::from_result(TranscriptionResult::failure(
                "",
                format!("voice session '{}' is closed", self.name),
            ));
        }

        debug!(
            session = %self.name,
            speaker,
            bytes = chunk.data().len(),
            "hearing audio"
        );

        let result = self.stt.recognize(chunk, None).await;

        if let TranscriptionResult::Success(transcript) = &result {
            if !transcript.text.is_empty() {
                let event = TranscriptionEvent {
                    session: self.name.clone(),
                    speaker: speaker.to_string(),
                    text: transcript.text.clone(),
                    language: transcript.language.clone(),
                };
                // No subscribers is not an error.
                let _ = self.transcription_tx.send(event);
            }
        }

        SpeechEvent::from_result(result)
    }

    pub fn subscribe_transcriptions(&self) -> broadcast::Receiver<TranscriptionEvent> {
        self.transcription_tx.subscribe()
    }

    /// Closes the recognizer and synthesizer. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(session = %self.name, "closing voice session");
        self.stt.close().await;
        self.tts.close().await;
    }
}
