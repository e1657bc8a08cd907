//! Parley agent binary.
//!
//! Loads configuration, installs structured logging, loads the speech model
//! (refusing to start without it), and feeds raw s16le PCM files through a
//! voice session. Each file produces one JSON speech event on stdout.

mod config;

use parley_types::{AudioChunk, TranscriptionResult};
use parley_voice::{BatchTranscriber, NullSynthesizer, SpeechEvent, VoiceSession};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (String, &'static str) {
    if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("config.toml".to_string(), "default")
}

fn speaker_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn transcribe_file(
    session: &VoiceSession,
    path: &Path,
    input: &config::InputConfig,
) -> SpeechEvent {
    let speaker = speaker_for(path);
    match tokio::fs::read(path).await {
        Ok(data) => {
            let chunk = AudioChunk::new(data, input.sample_rate, input.channels);
            tracing::info!(
                path = %path.display(),
                duration_ms = chunk.duration().as_millis() as u64,
                "transcribing file"
            );
            session.hear(&chunk, &speaker).await
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read input");
            SpeechEvent::from_result(TranscriptionResult::failure(
                "",
                format!("failed to read {}: {}", path.display(), e),
            ))
        }
    }
}

#[tokio::main]
async fn main() {
    let (config_path, config_source) = resolve_config_path();

    // Load configuration
    let config = config::load_config(Some(&config_path))
        .expect("failed to load configuration; the agent cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );

    let inputs: Vec<String> = std::env::args().skip(1).collect();
    if inputs.is_empty() {
        tracing::warn!("no input files given; usage: parley-agent <file.pcm>...");
        return;
    }

    // Load the model before anything else; there is no session without it.
    let stt = BatchTranscriber::load(&config.stt)
        .expect("failed to load speech model: check stt.model and stt.models_dir in config");

    let session = VoiceSession::new("parley-agent", Arc::new(stt), NullSynthesizer::default());

    let mut transcripts = session.subscribe_transcriptions();
    let listener = tokio::spawn(async move {
        while let Ok(event) = transcripts.recv().await {
            tracing::info!(speaker = %event.speaker, text = %event.text, "heard");
        }
    });

    // Awaited one at a time so results print in input order.
    for input in &inputs {
        let event = transcribe_file(&session, Path::new(input), &config.input).await;
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "failed to serialize speech event"),
        }
    }

    session.close().await;
    drop(session);
    let _ = listener.await;

    tracing::info!(files = inputs.len(), "parley agent finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_is_file_stem() {
        assert_eq!(speaker_for(Path::new("/tmp/alice.pcm")), "alice");
        assert_eq!(speaker_for(Path::new("bob")), "bob");
        assert_eq!(speaker_for(Path::new("/")), "unknown");
    }
}
