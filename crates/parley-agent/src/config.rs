//! Agent configuration loading from file and environment variables.

use parley_voice::{Device, SttConfig};
use serde::Deserialize;
use thiserror::Error;

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Speech-to-text model and policy settings.
    #[serde(default)]
    pub stt: SttConfig,

    /// Format of the raw PCM input files.
    #[serde(default)]
    pub input: InputConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Format of raw s16le input.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "parley_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_channels() -> u16 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PARLEY_MODEL` overrides `stt.model`
/// - `PARLEY_MODELS_DIR` overrides `stt.models_dir`
/// - `PARLEY_DEVICE` overrides `stt.device` (`cpu` or `gpu`)
/// - `PARLEY_LANGUAGE` overrides `stt.language`
/// - `PARLEY_LOG_LEVEL` overrides `logging.level`
/// - `PARLEY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(model) = var("PARLEY_MODEL") {
        config.stt.model = model;
    }
    if let Some(dir) = var("PARLEY_MODELS_DIR") {
        config.stt.models_dir = dir.into();
    }
    if let Some(device) = var("PARLEY_DEVICE") {
        match device.to_ascii_lowercase().as_str() {
            "cpu" => config.stt.device = Device::Cpu,
            "gpu" | "cuda" => config.stt.device = Device::Gpu,
            other => tracing::warn!(device = other, "ignoring unknown PARLEY_DEVICE"),
        }
    }
    if let Some(language) = var("PARLEY_LANGUAGE") {
        config.stt.language = language;
    }
    if let Some(level) = var("PARLEY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("PARLEY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_voice::{ComputeType, LanguagePolicy};
    use std::collections::HashMap;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).expect("defaults");
        assert_eq!(config.input.sample_rate, 16_000);
        assert_eq!(config.input.channels, 1);
        assert_eq!(config.stt.beam_size, 5);
    }

    #[test]
    fn parses_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [stt]
                model = "small"
                models_dir = "/var/lib/parley/models"
                device = "gpu"
                compute_type = "float16"
                language = "en"
                language_policy = "prefer_hint"
                max_concurrent_transcriptions = 2

                [input]
                sample_rate = 48000
                channels = 2

                [logging]
                level = "debug"
                json = true
            "#,
        )
        .unwrap();

        let config = load_config(path.to_str()).expect("parse");
        assert_eq!(config.stt.model, "small");
        assert_eq!(config.stt.device, Device::Gpu);
        assert_eq!(config.stt.compute_type, ComputeType::Float16);
        assert_eq!(config.stt.language_policy, LanguagePolicy::PreferHint);
        assert_eq!(config.stt.max_concurrent_transcriptions, 2);
        assert_eq!(config.stt.beam_size, 5);
        assert_eq!(config.input.sample_rate, 48_000);
        assert_eq!(config.input.channels, 2);
        assert!(config.logging.json);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stt\nmodel = ").unwrap();
        assert!(matches!(
            load_config(path.to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("PARLEY_MODEL", "tiny"),
            ("PARLEY_MODELS_DIR", "/tmp/models"),
            ("PARLEY_DEVICE", "CUDA"),
            ("PARLEY_LANGUAGE", "fr"),
            ("PARLEY_LOG_LEVEL", "warn"),
            ("PARLEY_LOG_JSON", "1"),
        ]
        .into_iter()
        .collect();

        let config = apply_env_overrides(Config::default(), |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.stt.model, "tiny");
        assert_eq!(config.stt.models_dir, std::path::PathBuf::from("/tmp/models"));
        assert_eq!(config.stt.device, Device::Gpu);
        assert_eq!(config.stt.language, "fr");
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn unknown_device_override_is_ignored() {
        let config = apply_env_overrides(Config::default(), |k| {
            (k == "PARLEY_DEVICE").then(|| "tpu".to_string())
        });
        assert_eq!(config.stt.device, Device::Cpu);
    }
}
