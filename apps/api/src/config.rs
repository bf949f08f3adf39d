use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::pipeline::RetryPolicy;
use crate::llm_client::{LlmSettings, DEFAULT_MODEL};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is malformed.
///
/// No `Debug`: holds the provider credential.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
            llm_temperature: parse_env("LLM_TEMPERATURE", 0.3)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 1)?,
            llm_retry_backoff_ms: parse_env("LLM_RETRY_BACKOFF_MS", 500)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8088)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            temperature: self.llm_temperature,
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }

    /// Retry count is clamped to `RetryPolicy::RETRY_CEILING`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.llm_max_retries,
            Duration::from_millis(self.llm_retry_backoff_ms),
        )
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        _ => Ok(default),
    }
}
