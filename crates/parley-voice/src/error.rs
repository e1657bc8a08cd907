use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("TTS error: {0}")]
    Tts(String),
}
