//! Configuration management for sotto
//!
//! Resolution order: built-in defaults, then the TOML config file
//! (`~/.config/sotto/config.toml`), then `SOTTO_*` environment variables,
//! then command-line flags. The file is a partial overlay — every field
//! is optional.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::{Error, Result};

/// Default inference endpoint (Ollama's local listener)
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:11434";

/// Timeout for the model-list fetch; the generate call itself has none
pub const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// sotto configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (history, memory, capture files)
    pub data_dir: PathBuf,

    /// Inference endpoint configuration
    pub inference: InferenceConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Command execution policy
    pub exec: ExecConfig,

    /// Number of history entries embedded in each prompt
    pub history_window: usize,

    /// Seconds to wait on the startup continue/refine menu
    pub menu_wait_secs: u64,
}

/// Inference endpoint configuration
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL of the generate/tags endpoint
    pub base_url: String,

    /// Context window requested via options.num_ctx
    pub num_ctx: u32,

    /// Sampling temperature for templated turns
    pub temperature: f64,

    /// Nucleus sampling parameter
    pub top_p: f64,

    /// Seconds to wait for a model selection before defaulting;
    /// `None` waits forever
    pub select_timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable speech input/output; off means text-only operation
    pub enabled: bool,

    /// Transcription endpoint (OpenAI-compatible multipart)
    pub stt_url: String,

    /// Transcription model identifier
    pub stt_model: String,

    /// Synthesis endpoint (OpenAI-compatible, returns MP3)
    pub tts_url: String,

    /// Synthesis model identifier
    pub tts_model: String,

    /// Synthesis voice identifier
    pub tts_voice: String,

    /// Synthesis speed multiplier
    pub tts_speed: f64,

    /// Bearer token sent to the STT/TTS endpoints, if any
    pub api_key: Option<String>,
}

/// Command execution policy
///
/// Model replies can carry a fenced command block. Executing it is an
/// explicit opt-in: `enabled` turns the feature on, and `confirm` asks
/// before each command unless deliberately switched off.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Allow executing commands extracted from model replies
    pub enabled: bool,

    /// Ask for interactive confirmation before each command
    pub confirm: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            confirm: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file, and environment
    ///
    /// # Errors
    ///
    /// Returns error if the platform directories cannot be determined or
    /// the data directory cannot be created
    pub fn load(file_override: Option<&std::path::Path>, no_voice: bool) -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "sotto")
            .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;

        let file_path = file_override
            .map_or_else(|| dirs.config_dir().join("config.toml"), PathBuf::from);
        let file = load_file(&file_path)?;

        let data_dir = file
            .data_dir
            .map_or_else(|| dirs.data_dir().to_path_buf(), PathBuf::from);
        std::fs::create_dir_all(&data_dir)?;

        let inference = InferenceConfig {
            base_url: env_or("SOTTO_INFERENCE_URL", file.inference.base_url)
                .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            num_ctx: file.inference.num_ctx.unwrap_or(12_096),
            temperature: file.inference.temperature.unwrap_or(0.5),
            top_p: file.inference.top_p.unwrap_or(0.9),
            select_timeout_secs: file.inference.select_timeout_secs,
        };

        let voice = VoiceConfig {
            enabled: !no_voice && file.voice.enabled.unwrap_or(true),
            stt_url: env_or("SOTTO_STT_URL", file.voice.stt_url).unwrap_or_else(|| {
                "https://api.openai.com/v1/audio/transcriptions".to_string()
            }),
            stt_model: file.voice.stt_model.unwrap_or_else(|| "whisper-1".to_string()),
            tts_url: env_or("SOTTO_TTS_URL", file.voice.tts_url)
                .unwrap_or_else(|| "https://api.openai.com/v1/audio/speech".to_string()),
            tts_model: file.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: file.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: file.voice.tts_speed.unwrap_or(1.0),
            api_key: env_or("SOTTO_SPEECH_API_KEY", file.voice.api_key),
        };

        let exec = ExecConfig {
            enabled: file.exec.enabled.unwrap_or(false),
            confirm: file.exec.confirm.unwrap_or(true),
        };

        Ok(Self {
            data_dir,
            inference,
            voice,
            exec,
            history_window: file.history_window.unwrap_or(40),
            menu_wait_secs: file.menu_wait_secs.unwrap_or(5),
        })
    }

    /// Path of the conversation history file
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("conversation_history.txt")
    }

    /// Path of the memory catalog file
    #[must_use]
    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join("memory.txt")
    }

    /// Path the last captured utterance is persisted to before transcription
    #[must_use]
    pub fn utterance_path(&self) -> PathBuf {
        self.data_dir.join("last_utterance.wav")
    }
}

fn env_or(key: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty()).or(fallback)
}

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    data_dir: Option<String>,

    #[serde(default)]
    history_window: Option<usize>,

    #[serde(default)]
    menu_wait_secs: Option<u64>,

    #[serde(default)]
    inference: InferenceFileConfig,

    #[serde(default)]
    voice: VoiceFileConfig,

    #[serde(default)]
    exec: ExecFileConfig,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceFileConfig {
    base_url: Option<String>,
    num_ctx: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    select_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct VoiceFileConfig {
    enabled: Option<bool>,
    stt_url: Option<String>,
    stt_model: Option<String>,
    tts_url: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    tts_speed: Option<f64>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExecFileConfig {
    enabled: Option<bool>,
    confirm: Option<bool>,
}

/// Parse the config file if present; a missing file is the defaults
fn load_file(path: &std::path::Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_defaults_are_safe() {
        let exec = ExecConfig::default();
        assert!(!exec.enabled);
        assert!(exec.confirm);
    }

    #[test]
    fn config_file_is_partial() {
        let parsed: ConfigFile = toml::from_str(
            r#"
            [inference]
            base_url = "http://10.0.0.2:11434"

            [exec]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(
            parsed.inference.base_url.as_deref(),
            Some("http://10.0.0.2:11434")
        );
        assert!(parsed.inference.num_ctx.is_none());
        assert_eq!(parsed.exec.enabled, Some(true));
        assert!(parsed.exec.confirm.is_none());
        assert!(parsed.voice.enabled.is_none());
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let parsed: ConfigFile = toml::from_str("").unwrap();
        assert!(parsed.data_dir.is_none());
        assert!(parsed.history_window.is_none());
    }
}
