#![allow(dead_code)]

use parley_voice::{
    BackendOutput, BackendSegment, BatchTranscriber, Resampler, SincResampler, SttConfig,
    TranscriptionBackend, TranscriptionInfo, VoiceError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the backend was asked to do on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub samples: usize,
    pub language: String,
    pub beam_size: usize,
}

/// Backend that records its inputs and returns one segment per started
/// second of audio, named after the call index.
#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Mutex<Vec<BackendCall>>,
    pub delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingBackend {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TranscriptionBackend for RecordingBackend {
    fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
        beam_size: usize,
    ) -> Result<BackendOutput, VoiceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(BackendCall {
                samples: samples.len(),
                language: language.to_string(),
                beam_size,
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let seconds = samples.len().div_ceil(16_000);
        let segments = (0..seconds)
            .map(|s| BackendSegment {
                text: format!(" call{} part{}", index, s),
                start_secs: s as f32,
                end_secs: ((s + 1) as f32).min(samples.len() as f32 / 16_000.0),
            })
            .collect();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(BackendOutput {
            segments,
            info: TranscriptionInfo {
                language: language.to_string(),
                language_probability: Some(0.99),
                confidence: None,
            },
        })
    }
}

/// Backend that always fails.
pub struct FailingBackend;

impl TranscriptionBackend for FailingBackend {
    fn transcribe(&self, _: &[f32], _: &str, _: usize) -> Result<BackendOutput, VoiceError> {
        Err(VoiceError::Inference("simulated inference failure".to_string()))
    }
}

/// Backend that panics mid-inference.
pub struct PanickingBackend;

impl TranscriptionBackend for PanickingBackend {
    fn transcribe(&self, _: &[f32], _: &str, _: usize) -> Result<BackendOutput, VoiceError> {
        panic!("simulated backend crash");
    }
}

/// Sinc resampler that counts how often it is called.
#[derive(Default)]
pub struct CountingResampler {
    pub calls: AtomicUsize,
}

impl CountingResampler {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resampler for CountingResampler {
    fn resample(
        &self,
        samples: &[f32],
        from_rate: u32,
        to_rate: u32,
    ) -> Result<Vec<f32>, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SincResampler.resample(samples, from_rate, to_rate)
    }
}

pub fn transcriber(backend: Arc<dyn TranscriptionBackend>) -> BatchTranscriber {
    BatchTranscriber::new(&SttConfig::default(), backend).expect("valid config")
}

/// A 440 Hz tone at half scale.
pub fn tone(frames: usize, sample_rate: u32, channels: u16) -> Vec<i16> {
    (0..frames)
        .flat_map(|i| {
            let t = i as f32 / sample_rate as f32;
            let v = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 16_384.0) as i16;
            std::iter::repeat(v).take(channels as usize)
        })
        .collect()
}
