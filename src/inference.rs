//! Inference endpoint client and model selection
//!
//! Speaks the local generate/tags wire format: POST `/api/generate` with
//! a JSON body and `stream: false`, GET `/api/tags` for the installed
//! model list. The generate call intentionally has no timeout; the tags
//! fetch is bounded by [`MODEL_LIST_TIMEOUT`].

use serde::{Deserialize, Serialize};

use crate::config::{InferenceConfig, MODEL_LIST_TIMEOUT};
use crate::console::Console;
use crate::{Error, Result};

/// Client for the generate/tags endpoint
pub struct InferenceClient {
    client: reqwest::Client,
    config: InferenceConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    temperature: f64,
    top_p: f64,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_ctx: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

#[derive(Deserialize)]
struct TaggedModel {
    name: String,
}

impl InferenceClient {
    /// Create a client for the configured endpoint
    #[must_use]
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Generate a completion for `prompt`
    ///
    /// Blocks for as long as the endpoint takes; there is no timeout on
    /// this call.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or an
    /// empty `response` field
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            options: GenerateOptions {
                num_ctx: self.config.num_ctx,
            },
        };

        tracing::debug!(model, prompt_chars = prompt.len(), "generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!("endpoint error {status}: {body}")));
        }

        let parsed: GenerateResponse = response.json().await?;
        match parsed.response {
            Some(text) if !text.trim().is_empty() => {
                tracing::debug!(reply_chars = text.len(), "generate complete");
                Ok(text)
            }
            _ => Err(Error::Inference("model returned an empty response".to_string())),
        }
    }

    /// List the models installed at the endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelSelection`] if the endpoint is unreachable
    /// within the bounded wait or replies with a non-success status
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::ModelSelection(format!("endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ModelSelection(format!("endpoint error {status}")));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| Error::ModelSelection(format!("malformed tags response: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Resolve a selection line against the model list
///
/// Accepts a 1-based index; anything else (non-numeric, out of range,
/// empty, absent) falls back to the first model.
#[must_use]
pub fn resolve_selection(models: &[String], input: Option<&str>) -> usize {
    let Some(line) = input else { return 0 };
    match line.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= models.len() => n - 1,
        _ => 0,
    }
}

/// Fetch the model list and let the user pick one from the console
///
/// Waits `config.select_timeout_secs` for a numeric line (forever when
/// unset); expiry or invalid input selects the first model.
///
/// # Errors
///
/// Returns [`Error::ModelSelection`] on fetch failure or an empty list —
/// there is no model to fall back to
pub async fn select_model(client: &InferenceClient, console: &mut Console) -> Result<String> {
    let models = client.list_models().await?;
    if models.is_empty() {
        return Err(Error::ModelSelection(
            "no models installed at the endpoint".to_string(),
        ));
    }

    println!("Available models:");
    for (index, name) in models.iter().enumerate() {
        println!("  {}. {name}", index + 1);
    }
    println!("Enter a model number (defaults to 1):");

    let line = match client.config.select_timeout_secs {
        Some(secs) => console
            .next_line_timeout(std::time::Duration::from_secs(secs))
            .await,
        None => console.next_line().await,
    };

    let index = resolve_selection(&models, line.as_deref());
    let chosen = models[index].clone();
    tracing::info!(model = %chosen, "model selected");
    println!("Selected model: {chosen}");
    Ok(chosen)
}
