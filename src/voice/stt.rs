//! Speech-to-text
//!
//! Transcribes captured WAV audio through an OpenAI-compatible multipart
//! endpoint. Recognition outcomes are typed: callers can tell "nothing
//! was said" and "could not understand" apart from transport failure,
//! and must re-capture on the former two rather than submit a turn.

use crate::config::VoiceConfig;
use crate::{Error, Result};

/// Outcome of a transcription attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized utterance text
    Text(String),
    /// The capture held no speech worth sending
    NoSpeech,
    /// The recognizer answered but could not understand the audio
    Unintelligible,
}

#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes WAV audio over HTTP
pub struct Transcriber {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl Transcriber {
    /// Create a transcriber from the voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.stt_url.clone(),
            model: config.stt_model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Transcribe WAV bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stt`] when the service is unreachable or answers
    /// with a non-success status — distinct from the in-band
    /// [`Transcript::Unintelligible`] outcome
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<Transcript> {
        if wav.is_empty() {
            return Ok(Transcript::NoSpeech);
        }

        tracing::debug!(bytes = wav.len(), "transcribing utterance");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Stt(format!("transcription request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("transcription error {status}: {body}")));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("malformed transcription response: {e}")))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            tracing::info!("recognizer could not understand the audio");
            return Ok(Transcript::Unintelligible);
        }

        tracing::info!(transcript = %text, "transcription complete");
        Ok(Transcript::Text(text))
    }
}
