//! Batch speech-to-text adapter.
//!
//! [`BatchTranscriber`] bridges one [`AudioChunk`] to one
//! [`TranscriptionResult`] using a locally loaded model. Inference is blocking
//! work and always runs on tokio's blocking pool, bounded by a semaphore, so
//! the caller's runtime thread keeps scheduling other tasks meanwhile.
//!
//! Per-call failures never cross this boundary as errors: they come back as
//! [`TranscriptionResult::Failure`]. Only construction can fail.

use crate::audio::{self, Resampler, SincResampler};
use crate::backend::{BackendOutput, TranscriptionBackend};
use crate::config::{LanguagePolicy, SttConfig};
use crate::error::VoiceError;
use crate::whisper::WhisperBackend;
use async_trait::async_trait;
use parley_types::{
    AudioChunk, SttCapabilities, Transcript, TranscriptSegment, TranscriptionResult,
    DEFAULT_CONFIDENCE,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

/// Contract a host session framework consumes for speech recognition.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Fixed for the lifetime of the instance.
    fn capabilities(&self) -> SttCapabilities;

    /// Transcribes one chunk. Never fails; failures are a result variant.
    async fn recognize(
        &self,
        chunk: &AudioChunk,
        language_hint: Option<&str>,
    ) -> TranscriptionResult;

    /// Idempotent, best-effort teardown.
    async fn close(&self);
}

pub struct BatchTranscriber {
    backend: Arc<dyn TranscriptionBackend>,
    resampler: Arc<dyn Resampler>,
    language: String,
    language_policy: LanguagePolicy,
    beam_size: usize,
    workers: Arc<Semaphore>,
    closed: AtomicBool,
    span: Span,
}

impl fmt::Debug for BatchTranscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchTranscriber")
            .field("language", &self.language)
            .field("language_policy", &self.language_policy)
            .field("beam_size", &self.beam_size)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl BatchTranscriber {
    /// Loads the whisper model described by `config`.
    ///
    /// Blocks while the model is read. An agent cannot start without its
    /// recognizer, so a load failure is returned rather than retried.
    pub fn load(config: &SttConfig) -> Result<Self, VoiceError> {
        let backend = WhisperBackend::load(config)?;
        Self::new(config, Arc::new(backend))
    }

    /// Wraps an already loaded backend.
    pub fn new(
        config: &SttConfig,
        backend: Arc<dyn TranscriptionBackend>,
    ) -> Result<Self, VoiceError> {
        config.validate()?;

        let span = info_span!(
            "stt",
            model = %config.model,
            device = ?config.device,
            compute_type = ?config.compute_type,
            language = %config.language,
        );

        span.in_scope(|| {
            info!(
                policy = ?config.language_policy,
                beam_size = config.beam_size,
                max_concurrent = config.max_concurrent_transcriptions,
                "batch transcriber ready"
            )
        });

        Ok(Self {
            backend,
            resampler: Arc::new(SincResampler),
            language: config.language.clone(),
            language_policy: config.language_policy,
            beam_size: config.beam_size,
            workers: Arc::new(Semaphore::new(config.max_concurrent_transcriptions)),
            closed: AtomicBool::new(false),
            span,
        })
    }

    /// Replaces the resampler used for non-16 kHz input.
    pub fn with_resampler(mut self, resampler: Arc<dyn Resampler>) -> Self {
        self.resampler = resampler;
        self
    }

    /// Emits all adapter logs inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The configured transcription language.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Language to transcribe in, plus the hint it overrules, if any.
    ///
    /// Only a non-empty hint that differs from the configured language counts
    /// as overruled.
    fn resolve_language<'h>(&self, hint: Option<&'h str>) -> (String, Option<&'h str>) {
        let hint = hint.filter(|h| !h.trim().is_empty());
        match (self.language_policy, hint) {
            (LanguagePolicy::PreferHint, Some(h)) => (h.to_string(), None),
            (LanguagePolicy::Pinned, Some(h)) if h != self.language => {
                (self.language.clone(), Some(h))
            }
            _ => (self.language.clone(), None),
        }
    }

    /// Runs `job` on the blocking pool once a worker permit is free.
    ///
    /// The permit travels with the job, so a caller that stops waiting does
    /// not free a slot while inference is still running.
    async fn run_blocking<T, F>(&self, job: F) -> Result<T, VoiceError>
    where
        F: FnOnce() -> Result<T, VoiceError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| VoiceError::Worker(format!("worker pool unavailable: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| VoiceError::Worker(format!("transcription worker failed: {}", e)))?
    }

    async fn transcribe(
        &self,
        chunk: &AudioChunk,
        language: &str,
    ) -> Result<Transcript, VoiceError> {
        let backend = Arc::clone(&self.backend);
        let resampler = Arc::clone(&self.resampler);
        let owned_chunk = chunk.clone();
        let job_language = language.to_string();
        let beam_size = self.beam_size;

        let output = self
            .run_blocking(move || -> Result<Option<BackendOutput>, VoiceError> {
                let samples = audio::prepare_samples(&owned_chunk, resampler.as_ref())?;
                if samples.is_empty() {
                    return Ok(None);
                }
                backend
                    .transcribe(&samples, &job_language, beam_size)
                    .map(Some)
            })
            .await?;

        let Some(output) = output else {
            debug!("chunk holds no complete frames, skipping inference");
            return Ok(Transcript::empty(language));
        };

        info!(
            detected_language = %output.info.language,
            language_probability = ?output.info.language_probability,
            segments = output.segments.len(),
            "backend finished"
        );

        let limit_ms = chunk.duration().as_millis() as u64;
        Ok(build_transcript(language, output, limit_ms))
    }
}

#[async_trait]
impl SpeechToText for BatchTranscriber {
    fn capabilities(&self) -> SttCapabilities {
        SttCapabilities::BATCH
    }

    async fn recognize(
        &self,
        chunk: &AudioChunk,
        language_hint: Option<&str>,
    ) -> TranscriptionResult {
        async {
            let (language, overruled) = self.resolve_language(language_hint);

            if self.is_closed() {
                warn!("recognize called after close");
                return TranscriptionResult::failure(language, "transcriber is closed");
            }

            if let Some(hint) = overruled {
                warn!(
                    hint,
                    configured = %self.language,
                    "ignoring language hint, using configured language"
                );
            }

            info!(
                bytes = chunk.data().len(),
                sample_rate = chunk.sample_rate(),
                channels = chunk.num_channels(),
                language = %language,
                "recognize"
            );
            if audio::needs_resampling(chunk) {
                warn!(
                    sample_rate = chunk.sample_rate(),
                    "input is not 16 kHz, resampling"
                );
            }

            match self.transcribe(chunk, &language).await {
                Ok(transcript) => {
                    info!(text = %transcript.text, "transcription result");
                    TranscriptionResult::Success(transcript)
                }
                Err(e) => {
                    error!(error = %e, "transcription failed");
                    TranscriptionResult::failure(language, e.to_string())
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.span.in_scope(|| info!("batch transcriber closed"));
        }
    }
}

fn secs_to_ms(secs: f32) -> u64 {
    (secs.max(0.0) * 1000.0) as u64
}

/// Reshapes backend output into a transcript, keeping backend segment order.
///
/// Offsets are clamped to `limit_ms`, the chunk duration; whisper timestamps
/// can overshoot the end of the audio slightly.
fn build_transcript(language: &str, output: BackendOutput, limit_ms: u64) -> Transcript {
    let detected = output.info.language;
    let segments = output
        .segments
        .into_iter()
        .map(|s| TranscriptSegment {
            text: s.text,
            start_ms: secs_to_ms(s.start_secs).min(limit_ms),
            end_ms: secs_to_ms(s.end_secs).min(limit_ms),
            language: Some(detected.clone()),
        })
        .collect();

    Transcript::from_segments(
        language,
        output.info.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        segments,
    )
}
