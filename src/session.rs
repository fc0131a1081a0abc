//! Per-process session context
//!
//! One `Session` is constructed at startup and threaded through the
//! pipeline by reference — it replaces what would otherwise be process
//! globals (selected model, clock, configuration).

use chrono::Local;
use uuid::Uuid;

use crate::config::Config;

/// Immutable per-process context
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier, stamped into persisted history headers
    pub id: String,

    /// Model chosen at startup; fixed for the process lifetime
    pub model: String,

    /// Resolved configuration
    pub config: Config,
}

impl Session {
    /// Create a session for the given model
    #[must_use]
    pub fn new(model: String, config: Config) -> Self {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(session = %id, model = %model, "session created");
        Self { id, model, config }
    }

    /// Current date, formatted the way prompts and history expect it
    #[must_use]
    pub fn current_date(&self) -> String {
        Local::now().format("%Y-%m-%d").to_string()
    }

    /// Current wall-clock time, 12-hour format
    #[must_use]
    pub fn current_time(&self) -> String {
        Local::now().format("%I:%M %p").to_string()
    }
}

/// Minimal config for unit tests; voice and exec both off
#[cfg(test)]
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    use crate::config::{ExecConfig, InferenceConfig, VoiceConfig};

    Config {
        data_dir: dir.to_path_buf(),
        inference: InferenceConfig {
            base_url: "http://localhost:11434".to_string(),
            num_ctx: 2048,
            temperature: 0.5,
            top_p: 0.9,
            select_timeout_secs: None,
        },
        voice: VoiceConfig {
            enabled: false,
            stt_url: String::new(),
            stt_model: String::new(),
            tts_url: String::new(),
            tts_model: String::new(),
            tts_voice: String::new(),
            tts_speed: 1.0,
            api_key: None,
        },
        exec: ExecConfig::default(),
        history_window: 40,
        menu_wait_secs: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_get_distinct_ids() {
        let dir = std::env::temp_dir();
        let a = Session::new("llama3".to_string(), test_config(&dir));
        let b = Session::new("llama3".to_string(), test_config(&dir));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn date_format_is_iso_like() {
        let dir = std::env::temp_dir();
        let s = Session::new("llama3".to_string(), test_config(&dir));
        let date = s.current_date();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
    }
}
