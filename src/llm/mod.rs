//! Chat-completions client for LLM-generated chart options.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (DeepSeek by
//! default). Requests are sent once with a fixed timeout and never retried.
//! The model is asked for a bare ECharts option object; a surrounding
//! Markdown code fence is tolerated and stripped before parsing.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::chart::error::{ChartError, ChartResult};
use crate::config::LlmConfig;

/// System prompt for chart generation.
const CHART_SYSTEM_PROMPT: &str = "You are a data visualisation expert who builds charts with \
    Apache ECharts. Based on the user's request and the supplied data, produce a complete, \
    valid ECharts option object. Return only the option object as JSON, with no explanation.";

/// Longest slice of an error body echoed back to the caller.
const MAX_ERROR_BODY: usize = 200;

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the configured chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// Creates a client from configuration, resolving the API key.
    ///
    /// A missing key is not an error here; calls fail with
    /// [`ChartError::MissingCredential`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::UpstreamFailure`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> ChartResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChartError::UpstreamFailure {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            timeout,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Returns `true` if an API key is available.
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends `messages` and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`ChartError::MissingCredential`] if no API key is configured
    /// - [`ChartError::UpstreamFailure`] on transport errors, timeouts or non-2xx status
    /// - [`ChartError::MalformedResponse`] if the body is not a chat completion
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> ChartResult<String> {
        let api_key = self.api_key.as_deref().ok_or(ChartError::MissingCredential)?;

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
            stream: false,
        };

        debug!(url = %self.api_url, model = %self.model, "sending chat completion request");
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(ChartError::UpstreamFailure {
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let completion: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ChartError::MalformedResponse {
                    message: format!("unexpected response body: {e}"),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChartError::MalformedResponse {
                message: "response contained no message content".to_string(),
            })
    }

    /// Asks the model for an ECharts option matching `prompt` and `data`.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::chat`], or [`ChartError::MalformedResponse`] if
    /// the reply is not JSON after fence stripping.
    pub async fn generate_chart_config(
        &self,
        prompt: &str,
        data: Option<&Value>,
    ) -> ChartResult<Value> {
        let messages = chart_messages(prompt, data)?;
        let content = self
            .chat(&messages, self.temperature, self.max_tokens)
            .await?;
        let config = extract_json(&content)?;
        info!(model = %self.model, "generated chart option");
        Ok(config)
    }

    fn transport_error(&self, e: &reqwest::Error) -> ChartError {
        let message = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else {
            e.to_string()
        };
        ChartError::UpstreamFailure { message }
    }
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("has_credential", &self.has_credential())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builds the system and user messages for chart generation.
///
/// # Errors
///
/// Returns an error if `data` cannot be serialised.
pub fn chart_messages(prompt: &str, data: Option<&Value>) -> ChartResult<Vec<ChatMessage>> {
    let data_text = match data {
        Some(value) if !value.is_null() => serde_json::to_string(value)?,
        _ => "none".to_string(),
    };

    Ok(vec![
        ChatMessage::system(CHART_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Request: {prompt}\n\nData: {data_text}\n\nReturn the ECharts option object:"
        )),
    ])
}

/// Removes a Markdown code fence around `content`, if present.
///
/// Handles a leading "```json" or bare "```" line and a trailing "```".
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses model output as a JSON value after fence stripping.
///
/// # Errors
///
/// Returns [`ChartError::MalformedResponse`] if the text is not valid JSON.
pub fn extract_json(content: &str) -> ChartResult<Value> {
    serde_json::from_str(strip_code_fence(content)).map_err(|e| ChartError::MalformedResponse {
        message: e.to_string(),
    })
}
