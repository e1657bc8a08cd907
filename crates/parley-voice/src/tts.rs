//! Placeholder speech synthesizer.
//!
//! Accepts text through the same streaming surface a real engine would and
//! reports completion, but produces no audio. Lets a session run end to end
//! before a synthesis engine is wired in.

use crate::error::VoiceError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const DEFAULT_NUM_CHANNELS: u16 = 1;

/// Delay before a one-shot synthesis reports completion.
const SYNTHESIZE_LATENCY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtsCapabilities {
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// All pushed text has been consumed.
    Finished,
}

#[derive(Debug, Clone)]
pub struct NullSynthesizer {
    sample_rate: u32,
    num_channels: u16,
}

impl Default for NullSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_NUM_CHANNELS)
    }
}

impl NullSynthesizer {
    pub fn new(sample_rate: u32, num_channels: u16) -> Self {
        info!(sample_rate, num_channels, "null synthesizer initialized");
        Self {
            sample_rate,
            num_channels,
        }
    }

    pub fn capabilities(&self) -> TtsCapabilities {
        TtsCapabilities { streaming: true }
    }

    /// Output sample rate a real engine would produce.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Opens a streaming session. Must be called inside a tokio runtime.
    pub fn stream(&self) -> SynthesisStream {
        debug!("opening synthesis stream");
        SynthesisStream::spawn()
    }

    /// One-shot synthesis; the receiver yields `Finished` shortly after.
    pub fn synthesize(&self, text: &str) -> mpsc::Receiver<SynthesisEvent> {
        info!(chars = text.chars().count(), "synthesize requested");
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(SYNTHESIZE_LATENCY).await;
            let _ = tx.send(SynthesisEvent::Finished).await;
        });
        rx
    }

    pub async fn close(&self) {
        info!("null synthesizer closed");
    }
}

/// Text goes in through [`push_text`](Self::push_text); events come out of
/// [`next_event`](Self::next_event). Exactly one `Finished` follows `close`.
#[derive(Debug)]
pub struct SynthesisStream {
    text_tx: Option<mpsc::UnboundedSender<String>>,
    events: mpsc::Receiver<SynthesisEvent>,
    task: Option<JoinHandle<()>>,
}

impl SynthesisStream {
    fn spawn() -> Self {
        let (text_tx, mut text_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, events) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            while let Some(text) = text_rx.recv().await {
                debug!(chars = text.chars().count(), "discarding text chunk");
            }
            let _ = event_tx.send(SynthesisEvent::Finished).await;
        });

        Self {
            text_tx: Some(text_tx),
            events,
            task: Some(task),
        }
    }

    pub fn push_text(&self, text: &str) -> Result<(), VoiceError> {
        let tx = self
            .text_tx
            .as_ref()
            .ok_or_else(|| VoiceError::Tts("synthesis stream is closed".to_string()))?;
        tx.send(text.to_string())
            .map_err(|_| VoiceError::Tts("synthesis task has stopped".to_string()))
    }

    /// Ends input. Idempotent.
    pub fn close(&mut self) {
        if self.text_tx.take().is_some() {
            debug!("synthesis stream input closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.text_tx.is_none()
    }

    /// Next event, or `None` once the stream has finished.
    pub async fn next_event(&mut self) -> Option<SynthesisEvent> {
        let event = self.events.recv().await;
        if event.is_none() {
            if let Some(task) = self.task.take() {
                let _ = task.await;
            }
        }
        event
    }
}
