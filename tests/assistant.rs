//! Conversation loop behavior without audio hardware or a live endpoint
//!
//! Voice is disabled and exec stays at its safe defaults; the inference
//! endpoint points at an unroutable local port so generate calls fail
//! fast and the degradation paths are observable in history.

use std::path::Path;

use sotto::config::{Config, ExecConfig, InferenceConfig, VoiceConfig};
use sotto::console::Console;
use sotto::inference::InferenceClient;
use sotto::{Assistant, Session};

fn offline_config(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        inference: InferenceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            num_ctx: 2048,
            temperature: 0.5,
            top_p: 0.9,
            select_timeout_secs: Some(1),
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

fn offline_assistant(data_dir: &Path) -> Assistant {
    let config = offline_config(data_dir);
    let client = InferenceClient::new(config.inference.clone());
    let session = Session::new("llama3".to_string(), config);
    Assistant::new(session, client, Console::spawn(), true).unwrap()
}

#[tokio::test]
async fn unreachable_endpoint_degrades_to_an_apology() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = offline_assistant(dir.path());

    assistant.turn("hello there").await;

    let rendered = assistant.history().render_window();
    assert!(rendered.contains("user: hello there"));
    assert!(rendered.contains("trouble reaching the language model"));
}

#[tokio::test]
async fn reply_without_fences_records_an_extraction_event() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = offline_assistant(dir.path());

    assistant.handle_reply("Just a chatty answer, nothing to run.").await;

    let rendered = assistant.history().render_window();
    assert!(rendered.contains("command extraction failed: response contains no fenced block"));
    assert!(rendered.contains("assistant: Just a chatty answer, nothing to run."));
}

#[tokio::test]
async fn ambiguous_reply_records_an_extraction_event() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = offline_assistant(dir.path());

    assistant
        .handle_reply("```bash\nls\n``` or maybe ```bash\npwd\n```")
        .await;

    let rendered = assistant.history().render_window();
    assert!(rendered.contains("more than one fenced block"));
}

#[tokio::test]
async fn extracted_commands_are_not_run_without_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("should-not-exist");
    let mut assistant = offline_assistant(dir.path());

    let reply = format!("On it.\n```bash\ntouch {}; echo done\n```", marker.display());
    assistant.handle_reply(&reply).await;

    assert!(!marker.exists());
    let rendered = assistant.history().render_window();
    assert_eq!(rendered.matches("command not executed (exec disabled)").count(), 2);
}

#[tokio::test]
async fn one_fetch_attempt_per_distinct_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = offline_assistant(dir.path());

    // loopback targets are refused by the fetch guard before any request,
    // so each distinct URL still produces exactly one recorded attempt
    assistant
        .handle_reply(
            "compare http://127.0.0.1/a and http://127.0.0.1/b \
             (again: http://127.0.0.1/a)",
        )
        .await;

    let rendered = assistant.history().render_window();
    assert_eq!(rendered.matches("fetch failed for").count(), 2);
    assert!(rendered.contains("fetch failed for http://127.0.0.1/a"));
    assert!(rendered.contains("fetch failed for http://127.0.0.1/b"));
}
