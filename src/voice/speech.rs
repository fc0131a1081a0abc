//! Speech task ownership
//!
//! A single `SpeechTask` handle owns whatever synthesis/playback is in
//! flight. Starting a new utterance cancels the previous one first, so
//! "at most one speech task active" is enforced here rather than assumed
//! by callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::VoiceConfig;
use crate::voice::playback;
use crate::voice::tts::Synthesizer;

/// Single-owner handle over the live speech task
pub struct SpeechTask {
    synthesizer: Option<Arc<Synthesizer>>,
    cancel: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl SpeechTask {
    /// Create the handle; with voice disabled every `start` is a no-op
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        let synthesizer = config.enabled.then(|| Arc::new(Synthesizer::new(config)));
        Self {
            synthesizer,
            cancel: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Begin speaking `text`, cancelling any utterance still in flight
    ///
    /// Synthesis failures are logged, never surfaced: speech is a
    /// best-effort side channel next to the printed reply.
    pub fn start(&mut self, text: &str) {
        self.cancel();

        let Some(synthesizer) = self.synthesizer.clone() else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);

        let text = text.to_string();
        self.task = Some(tokio::spawn(async move {
            let mp3 = match synthesizer.synthesize(&text).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "speech synthesis failed");
                    return;
                }
            };

            if cancel.load(Ordering::Relaxed) {
                return;
            }

            let samples = match playback::decode_mp3(&mp3) {
                Ok(samples) => samples,
                Err(e) => {
                    tracing::warn!(error = %e, "could not decode synthesis output");
                    return;
                }
            };

            let playback = tokio::task::spawn_blocking(move || {
                playback::play_blocking(samples, &cancel)
            })
            .await;

            match playback {
                Ok(Err(e)) => tracing::warn!(error = %e, "playback failed"),
                Err(e) => tracing::warn!(error = %e, "playback task panicked"),
                Ok(Ok(())) => {}
            }
        }));
    }

    /// Interrupt the live utterance immediately; idempotent
    pub fn cancel(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("speech cancelled");
        }
    }

    /// True while an utterance is being synthesized or played
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SpeechTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> VoiceConfig {
        VoiceConfig {
            enabled: false,
            stt_url: String::new(),
            stt_model: String::new(),
            tts_url: String::new(),
            tts_model: String::new(),
            tts_voice: String::new(),
            tts_speed: 1.0,
            api_key: None,
        }
    }

    #[test]
    fn disabled_voice_start_is_a_noop() {
        tokio_test::block_on(async {
            let mut speech = SpeechTask::new(&disabled_config());
            speech.start("hello");
            assert!(!speech.is_busy());
        });
    }

    #[test]
    fn cancel_is_idempotent() {
        tokio_test::block_on(async {
            let mut speech = SpeechTask::new(&disabled_config());
            speech.cancel();
            speech.cancel();
            assert!(!speech.is_busy());
        });
    }
}
