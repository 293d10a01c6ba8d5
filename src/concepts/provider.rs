//! HTTP concept extractor
//!
//! Implements `ConceptExtractor` on top of any OpenAI-compatible
//! `/v1/chat/completions` endpoint (OpenAI, Ollama, LiteLLM, vLLM...).
//!
//! Configuration comes from [`ExtractorConfig`](crate::ExtractorConfig):
//! - `url` (env `CONCEPTS_URL`, default `https://api.openai.com/v1/chat/completions`)
//! - `model` (env `CONCEPTS_MODEL`, default `gpt-3.5-turbo`)
//! - `api_key` (env `OPENAI_API_KEY`, falling back to `MY_SECRET`)

use super::traits::ConceptExtractor;
use crate::ExtractorConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-completions backed concept extractor.
///
/// Cheap to clone (shares the reqwest client).
#[derive(Clone)]
pub struct HttpConceptExtractor {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpConceptExtractor {
    /// Create an extractor with explicit settings.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Create an extractor from the `extractor` config section.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        Self::new(
            config.url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn concepts_prompt(text: &str) -> String {
        format!(
            "Extract the main concepts from the note below for a knowledge graph. \
             Reply with the concepts only, as a comma-separated list of short phrases, \
             without any label.\n\nNote:\n{text}"
        )
    }

    fn summary_prompt(text: &str) -> String {
        format!("Write a one-sentence summary of the following note:\n\"{text}\"")
    }

    /// Send one user message and return the assistant reply text.
    async fn complete(&self, prompt: String) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .with_context(|| format!("Failed to connect to chat API at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(detail) = err.error {
                    anyhow::bail!("Chat API error ({}): {}", status.as_u16(), detail.message);
                }
            }
            anyhow::bail!("Chat API returned {}: {}", status.as_u16(), body);
        }

        let resp: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat API response")?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Chat API returned no choices")
    }
}

/// Parse a model reply into a concept list.
///
/// Strips a leading `Concepts:` label, then splits on commas and line breaks.
/// Each item is trimmed and loses a leading `- ` or `* ` bullet; empty items
/// are dropped.
pub fn parse_concepts(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    let reply = reply.strip_prefix("Concepts:").unwrap_or(reply);
    reply
        .split([',', '\n', '\r'])
        .map(|item| {
            let item = item.trim();
            item.strip_prefix("- ")
                .or_else(|| item.strip_prefix("* "))
                .unwrap_or(item)
                .trim()
        })
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ConceptExtractor for HttpConceptExtractor {
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>> {
        let reply = self.complete(Self::concepts_prompt(text)).await?;
        Ok(parse_concepts(&reply))
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let reply = self.complete(Self::summary_prompt(text)).await?;
        Ok(reply.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
