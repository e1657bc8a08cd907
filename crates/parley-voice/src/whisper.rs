use crate::backend::{BackendOutput, BackendSegment, TranscriptionBackend, TranscriptionInfo};
use crate::config::{Device, SttConfig};
use crate::error::VoiceError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// whisper.cpp reports timestamps in centiseconds.
const CENTISECONDS_PER_SECOND: f32 = 100.0;

/// Transcription backend over whisper.cpp via `whisper-rs`.
///
/// The model is loaded once; each call creates its own inference state from
/// the shared context.
pub struct WhisperBackend {
    context: WhisperContext,
    model_path: PathBuf,
    threads: usize,
}

impl fmt::Debug for WhisperBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhisperBackend")
            .field("model_path", &self.model_path)
            .field("threads", &self.threads)
            .finish()
    }
}

impl WhisperBackend {
    /// Loads the model selected by `config`. Fails fast if the file is
    /// missing or whisper.cpp rejects it.
    pub fn load(config: &SttConfig) -> Result<Self, VoiceError> {
        config.validate()?;

        let model_path = config.model_path();
        if !model_path.exists() {
            return Err(VoiceError::ModelLoad(format!(
                "Whisper model not found at: {}",
                model_path.display()
            )));
        }
        let path_str = model_path.to_str().ok_or_else(|| {
            VoiceError::ModelLoad(format!("Invalid model path: {}", model_path.display()))
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu(config.device == Device::Gpu);
        params.gpu_device(config.gpu_device);

        let context = WhisperContext::new_with_params(path_str, params)
            .map_err(|e| VoiceError::ModelLoad(format!("Failed to load Whisper model: {}", e)))?;

        info!(
            model = %model_path.display(),
            device = ?config.device,
            compute_type = ?config.compute_type,
            "whisper model loaded"
        );

        Ok(Self {
            context,
            model_path,
            threads: config.threads,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl TranscriptionBackend for WhisperBackend {
    fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
        beam_size: usize,
    ) -> Result<BackendOutput, VoiceError> {
        let mut state = self
            .context
            .create_state()
            .map_err(|e| VoiceError::Inference(format!("Failed to create Whisper state: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: beam_size as i32,
            patience: -1.0,
        });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_no_context(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(self.threads as i32);

        state
            .full(params, samples)
            .map_err(|e| VoiceError::Inference(format!("Whisper inference failed: {}", e)))?;

        let mut segments = Vec::new();
        let mut probability_sum = 0.0f32;
        let mut token_count = 0usize;

        for seg_idx in 0..state.full_n_segments() {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            let text = segment
                .to_str()
                .map_err(|e| VoiceError::Inference(format!("Invalid segment text: {}", e)))?;

            for tok_idx in 0..segment.n_tokens() {
                let token = match segment.get_token(tok_idx) {
                    Some(t) => t,
                    None => continue,
                };
                // Special tokens look like [_BEG_] or <|endoftext|>.
                let is_special = match token.to_str() {
                    Ok(t) => {
                        let t = t.trim();
                        t.is_empty() || t.starts_with('[') || t.starts_with('<')
                    }
                    Err(_) => true,
                };
                if !is_special {
                    probability_sum += token.token_probability();
                    token_count += 1;
                }
            }

            segments.push(BackendSegment {
                text: text.to_string(),
                start_secs: segment.start_timestamp() as f32 / CENTISECONDS_PER_SECOND,
                end_secs: segment.end_timestamp() as f32 / CENTISECONDS_PER_SECOND,
            });
        }

        let confidence = (token_count > 0).then(|| probability_sum / token_count as f32);
        let (detected, language_probability) =
            detected_language(state.full_lang_id_from_state().ok(), language);

        Ok(BackendOutput {
            segments,
            info: TranscriptionInfo {
                language: detected,
                language_probability,
                confidence,
            },
        })
    }
}

/// Maps the language id whisper decoded with to a code and its probability.
///
/// The language is always forced, so whisper skips detection: a decoded
/// language equal to the requested one is certain, anything else has no
/// known probability.
fn detected_language(lang_id: Option<i32>, requested: &str) -> (String, Option<f32>) {
    match lang_id.and_then(whisper_rs::get_lang_str) {
        Some(code) if code == requested => (code.to_string(), Some(1.0)),
        Some(code) => (code.to_string(), None),
        None => (requested.to_string(), None),
    }
}
