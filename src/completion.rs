//! Completion provider abstraction and implementations.
//!
//! A completion provider turns the composed prompt into a reply string:
//! - **[`DisabledCompletion`]**: returns errors; used when no model is configured.
//! - **[`OpenAICompletion`]**: `POST /v1/chat/completions`, prompt sent as a single system message.
//! - **[`OllamaCompletion`]**: `POST /api/chat` on a local Ollama instance, non-streaming.
//!
//! Both HTTP providers share the retry policy in [`crate::http`].

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::CompletionConfig;
use crate::http;

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";

/// Trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    /// Send `prompt` and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the [`CompletionProvider`] selected by `completion.provider`.
pub fn create_completion(config: &CompletionConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompletion)),
        "openai" => Ok(Arc::new(OpenAICompletion::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaCompletion::new(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

// ============ Disabled ============

pub struct DisabledCompletion;

#[async_trait]
impl CompletionProvider for DisabledCompletion {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Completion provider is disabled")
    }
}

// ============ OpenAI ============

/// Chat completions against the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAICompletion {
    model: String,
    base_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAICompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model: config.model_name(),
            base_url: config.url.clone().unwrap_or_else(|| OPENAI_URL.to_string()),
            api_key,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "system", "content": prompt }],
        });
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let json = http::post_json(
            &self.client,
            "OpenAI",
            &url,
            Some(&self.api_key),
            &body,
            self.max_retries,
        )
        .await?;
        parse_openai_reply(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_openai_reply(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

// ============ Ollama ============

/// Chat completions against a local Ollama instance.
pub struct OllamaCompletion {
    model: String,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            model: config.model_name(),
            url: config.url.clone().unwrap_or_else(|| OLLAMA_URL.to_string()),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OllamaCompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "system", "content": prompt }],
            "stream": false,
        });
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let json =
            http::post_json(&self.client, "Ollama", &url, None, &body, self.max_retries).await?;
        parse_ollama_reply(&json)
    }
}

fn parse_ollama_reply(json: &serde_json::Value) -> Result<String> {
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
}
