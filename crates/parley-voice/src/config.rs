use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_model() -> String {
    "base".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_language() -> String {
    "de".to_string()
}

fn default_beam_size() -> usize {
    5
}

fn default_max_concurrent_transcriptions() -> usize {
    1
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4)
}

/// Compute device the model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
}

/// Numeric precision of the model weights.
///
/// whisper.cpp bakes quantization into the model file, so this selects which
/// file variant is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeType {
    #[default]
    Int8,
    Int5,
    Float16,
}

impl ComputeType {
    fn file_suffix(self) -> &'static str {
        match self {
            Self::Int8 => "-q8_0",
            Self::Int5 => "-q5_1",
            Self::Float16 => "",
        }
    }
}

/// How a per-call language hint interacts with the configured language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguagePolicy {
    /// Always transcribe in the configured language; hints are ignored.
    #[default]
    Pinned,
    /// Use a non-empty hint when one is given.
    PreferHint,
}

/// Speech-to-text settings, fixed for the lifetime of a transcriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SttConfig {
    /// Model size or identifier, e.g. `tiny`, `base`, `small`, `large-v3`.
    #[serde(default = "default_model")]
    pub model: String,
    /// Directory holding `ggml-*.bin` model files.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default)]
    pub device: Device,
    /// GPU index when `device = "gpu"`.
    #[serde(default)]
    pub gpu_device: i32,
    #[serde(default)]
    pub compute_type: ComputeType,
    /// Language code used for every transcription, e.g. `de`.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub language_policy: LanguagePolicy,
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,
    /// Upper bound on transcriptions running on the worker pool at once.
    #[serde(default = "default_max_concurrent_transcriptions")]
    pub max_concurrent_transcriptions: usize,
    /// Inference threads per transcription.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            models_dir: default_models_dir(),
            device: Device::default(),
            gpu_device: 0,
            compute_type: ComputeType::default(),
            language: default_language(),
            language_policy: LanguagePolicy::default(),
            beam_size: default_beam_size(),
            max_concurrent_transcriptions: default_max_concurrent_transcriptions(),
            threads: default_threads(),
        }
    }
}

impl SttConfig {
    pub fn new(model: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    /// File name of the model variant selected by `model` and `compute_type`.
    pub fn model_file_name(&self) -> String {
        format!("ggml-{}{}.bin", self.model, self.compute_type.file_suffix())
    }

    /// Full path of the model file. An absolute `model` path is used as is.
    pub fn model_path(&self) -> PathBuf {
        let as_path = PathBuf::from(&self.model);
        if as_path.is_absolute() {
            as_path
        } else {
            self.models_dir.join(self.model_file_name())
        }
    }

    pub fn validate(&self) -> Result<(), VoiceError> {
        if self.model.trim().is_empty() {
            return Err(VoiceError::Config("model must not be empty".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(VoiceError::Config("language must not be empty".to_string()));
        }
        if self.beam_size == 0 {
            return Err(VoiceError::Config(
                "beam_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_transcriptions == 0 {
            return Err(VoiceError::Config(
                "max_concurrent_transcriptions must be at least 1".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(VoiceError::Config("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
