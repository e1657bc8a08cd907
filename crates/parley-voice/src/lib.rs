//! Batch speech-to-text bridge for voice agents.
//!
//! Adapts a local, non-streaming transcription model to a host voice-session
//! framework: captured PCM chunks go in, typed transcription results come
//! out. The host owns transport, VAD, turn-taking and playback.
//!
//! The pieces:
//!
//! | Module | Role |
//! |--------|------|
//! | [`stt`] | [`BatchTranscriber`], the adapter, and the [`SpeechToText`] trait hosts consume |
//! | [`audio`] | PCM16 decode, channel downmix, normalization, resampling to 16 kHz |
//! | [`backend`] / [`whisper`] | the blocking model seam and its whisper.cpp implementation |
//! | [`event`] | the single mapping from results to the host's event shape |
//! | [`tts`] | a synthesizer stub that accepts text and produces no audio |
//! | [`session`] | a thin session fanning transcripts out to subscribers |
//!
//! Inference never runs on the async runtime's worker threads; see
//! [`BatchTranscriber`] for the concurrency contract.

pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod stt;
pub mod tts;
pub mod whisper;

pub use audio::{needs_resampling, Resampler, SincResampler, TARGET_SAMPLE_RATE};
pub use backend::{BackendOutput, BackendSegment, TranscriptionBackend, TranscriptionInfo};
pub use config::{ComputeType, Device, LanguagePolicy, SttConfig};
pub use error::VoiceError;
pub use event::{SpeechAlternative, SpeechEvent, SpeechEventKind};
pub use session::{TranscriptionEvent, VoiceSession};
pub use stt::{BatchTranscriber, SpeechToText};
pub use tts::{NullSynthesizer, SynthesisEvent, SynthesisStream, TtsCapabilities};
pub use whisper::WhisperBackend;
