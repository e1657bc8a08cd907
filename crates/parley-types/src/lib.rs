//! Shared data model for the Parley speech bridge.
//!
//! This crate holds the plain types that cross the boundary between a host
//! voice-session framework and the transcription adapter in `parley-voice`:
//! the captured audio handed in, and the transcription result handed back.
//!
//! Nothing here performs I/O or inference. Keeping the data model in its own
//! crate lets hosts depend on the shapes without pulling in the model runtime.

pub mod audio;
pub mod transcript;

pub use audio::AudioChunk;
pub use transcript::{
    SttCapabilities, Transcript, TranscriptSegment, TranscriptionResult, DEFAULT_CONFIDENCE,
};
