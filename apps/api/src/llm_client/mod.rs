//! LLM Client: the single point of entry for all model calls.
//!
//! No other module talks to the provider API directly; the orchestrator only
//! sees the `LanguageModel` trait. This client applies a hard per-call
//! timeout and classifies failures, but never retries: retry policy belongs
//! to the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::prompt_builder::PromptSpec;

pub mod prompts;

/// Default model when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const MAX_TOKENS: u32 = 4096;
/// Upstream error bodies are cut to this many characters before logging.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM call timed out after {secs}s")]
    UpstreamTimeout { secs: u64 },

    #[error("LLM API error (status {status:?}): {message}")]
    UpstreamError { status: Option<u16>, message: String },

    #[error("LLM API rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
}

impl LlmError {
    /// Only transient transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::UpstreamTimeout { .. } | LlmError::RateLimited { .. }
        )
    }
}

/// Untyped model output. Nothing about its shape is assumed until the
/// response validator has checked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelOutput(String);

impl RawModelOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Anything that can turn a prompt into raw model output.
///
/// Carried by the pipeline as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &PromptSpec) -> Result<RawModelOutput, LlmError>;
}

/// Connection settings for the chat-completions API.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<String>,
}

/// The process-wide client for the OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn request_body<'a>(&'a self, prompt: &'a PromptSpec) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::UpstreamTimeout {
                secs: self.settings.timeout.as_secs(),
            }
        } else {
            LlmError::UpstreamError {
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn invoke(&self, prompt: &PromptSpec) -> Result<RawModelOutput, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let error = classify_failure(status.as_u16(), retry_after, &body);
            warn!("LLM API returned {status}: {error}");
            return Err(error);
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::UpstreamError {
                status: Some(status.as_u16()),
                message: "response contained no choices".to_string(),
            })?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!("LLM output was truncated at the token limit");
        }

        Ok(RawModelOutput::new(choice.message.content.unwrap_or_default()))
    }
}

/// Maps a non-success HTTP response to an `LlmError`.
///
/// 429 is a rate limit unless the provider says the quota is exhausted,
/// which no amount of waiting fixes.
fn classify_failure(status: u16, retry_after: Option<u64>, body: &str) -> LlmError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let quota_exhausted = parsed
        .as_ref()
        .and_then(|e| e.error.code.as_deref())
        .is_some_and(|code| code == "insufficient_quota");

    if status == 429 && !quota_exhausted {
        return LlmError::RateLimited { retry_after };
    }

    let message = parsed
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect());
    LlmError::UpstreamError {
        status: Some(status),
        message,
    }
}
