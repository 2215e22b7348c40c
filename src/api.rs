//! LLM completion client.
//!
//! The summarizer talks to the model through the [`AskAsync`] trait so the
//! transport can be swapped out. [`ChatClient`] is the production
//! implementation: a single-turn request against an OpenAI-compatible
//! `/chat/completions` endpoint.
//!
//! Retries are not handled here. Callers wrap [`AskAsync::ask`] in a
//! [`crate::retry::RetryPolicy`], which re-sends the same prompt.

use crate::config::LlmConfig;
use crate::error::{NewsError, Result};
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// Send a system prompt and a user prompt, receive the model's text reply.
    async fn ask(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client.
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NewsError::Config(format!("failed to build LLM client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint())
            .field("model", &self.config.model)
            .finish()
    }
}

/// Pull the reply text out of a raw completion response body.
///
/// # Arguments
///
/// * `body` - The JSON body returned by `/chat/completions`
///
/// # Returns
///
/// The trimmed content of the first choice.
///
/// # Errors
///
/// [`NewsError::Api`] when the body is not a completion response or the
/// first choice carries no text.
pub fn extract_reply(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        NewsError::Api(format!(
            "malformed completion response ({}): {}",
            e,
            truncate_for_log(body, 200)
        ))
    })?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(NewsError::Api("model returned an empty reply".to_string()));
    }
    Ok(content)
}

impl AskAsync for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, system: &str, prompt: &str) -> Result<String> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NewsError::Api(format!("completion request timed out: {}", e))
                } else {
                    NewsError::Api(format!("completion request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Api(format!("failed reading completion body: {}", e)))?;
        let dt = t0.elapsed();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(elapsed_ms = dt.as_millis() as u64, "LLM endpoint rate limited the request");
            return Err(NewsError::RateLimit(format!(
                "completion endpoint returned {}: {}",
                status,
                truncate_for_log(&body, 200)
            )));
        }
        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis() as u64, %status, "API call failed");
            return Err(NewsError::Api(format!(
                "completion endpoint returned {}: {}",
                status,
                truncate_for_log(&body, 200)
            )));
        }

        let reply = extract_reply(&body)?;
        debug!(elapsed_ms = dt.as_millis() as u64, chars = reply.len(), "Completion received");
        Ok(reply)
    }
}
