//! Orchestrator: runs one request through
//! `Received → Extracting → Normalizing → Prompting → Invoking → Validating`
//! and ends in `Succeeded` or `Failed`.
//!
//! The first error ends the run; nothing partial is returned. Only the
//! Invoking step is ever repeated, and only for timeouts and rate limits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::improvements::{summarize, ImprovementsSummary};
use crate::analysis::language::detect_language;
use crate::analysis::prompt_builder::{self, Operation, PromptSpec};
use crate::analysis::request::{normalize, AnalysisRequest, RawAnalysisParams, SocialLinks};
use crate::analysis::schema::{AnalysisResult, CareerRecommendation};
use crate::analysis::validator::{validate, ModelSchema};
use crate::errors::AppError;
use crate::extraction::{extract, RawUpload};
use crate::llm_client::{LanguageModel, LlmError, RawModelOutput};

/// Upper bound on a provider-requested `Retry-After` wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Extracting,
    Normalizing,
    Prompting,
    Invoking,
    Validating,
    Succeeded,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Received => "received",
            PipelineState::Extracting => "extracting",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Prompting => "prompting",
            PipelineState::Invoking => "invoking",
            PipelineState::Validating => "validating",
            PipelineState::Succeeded => "succeeded",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Bounded retry for transient LLM failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Hard ceiling on `max_retries`, whatever the configuration says.
    pub const RETRY_CEILING: u32 = 2;

    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries: max_retries.min(Self::RETRY_CEILING),
            base_backoff,
        }
    }

    /// Wait before retry number `attempt + 1`: the provider's `Retry-After`
    /// when given (capped), otherwise exponential backoff from the base.
    fn delay(&self, attempt: u32, error: &LlmError) -> Duration {
        if let LlmError::RateLimited {
            retry_after: Some(secs),
        } = error
        {
            return Duration::from_secs(*secs).min(MAX_RETRY_AFTER);
        }
        self.base_backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_millis(500))
    }
}

/// Response body of analyze-and-rewrite: the validated model result plus the
/// locally computed summary and the caller's links.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub improvements_summary: ImprovementsSummary,
    pub social_links: SocialLinks,
}

/// Stateless across requests; one instance is shared by every handler.
pub struct Pipeline {
    model: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(model: Arc<dyn LanguageModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    pub async fn analyze_and_rewrite(
        &self,
        upload: RawUpload,
        params: RawAnalysisParams,
    ) -> Result<AnalysisResponse, AppError> {
        let (request, result) = self
            .execute::<AnalysisResult>(Operation::Rewrite, upload, params)
            .await?;

        let input_language = detect_language(request.extracted_text.as_str());
        let improvements_summary = summarize(&result, input_language, request.output_language);

        Ok(AnalysisResponse {
            result,
            improvements_summary,
            social_links: request.social_links,
        })
    }

    pub async fn recommend_careers(
        &self,
        upload: RawUpload,
        params: RawAnalysisParams,
    ) -> Result<CareerRecommendation, AppError> {
        let (_, recommendation) = self
            .execute::<CareerRecommendation>(Operation::Recommend, upload, params)
            .await?;
        Ok(recommendation)
    }

    async fn execute<T: ModelSchema>(
        &self,
        operation: Operation,
        upload: RawUpload,
        params: RawAnalysisParams,
    ) -> Result<(AnalysisRequest, T), AppError> {
        let span = info_span!(
            "pipeline",
            request_id = %Uuid::new_v4(),
            operation = ?operation,
        );

        async move {
            let mut run = Run::new();
            match self.stages::<T>(&mut run, operation, upload, params).await {
                Ok(output) => {
                    run.advance(PipelineState::Succeeded);
                    info!("Pipeline succeeded");
                    Ok(output)
                }
                Err(error) => {
                    warn!(stage = %run.state, kind = error.kind(), "Pipeline failed: {error}");
                    run.advance(PipelineState::Failed);
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn stages<T: ModelSchema>(
        &self,
        run: &mut Run,
        operation: Operation,
        upload: RawUpload,
        params: RawAnalysisParams,
    ) -> Result<(AnalysisRequest, T), AppError> {
        run.advance(PipelineState::Extracting);
        // Parsing is CPU-bound; the upload bytes are dropped when the task ends.
        let text = tokio::task::spawn_blocking(move || extract(upload))
            .await
            .map_err(|e| AppError::Internal(anyhow!("Extraction task failed: {e}")))??;
        debug!("Extracted {} characters", text.as_str().chars().count());

        run.advance(PipelineState::Normalizing);
        let request = normalize(text, params)?;

        run.advance(PipelineState::Prompting);
        let prompt = prompt_builder::build(&request, operation);

        run.advance(PipelineState::Invoking);
        let raw = self.invoke_with_retry(&prompt).await?;

        run.advance(PipelineState::Validating);
        let result = validate::<T>(&raw, &request)?;

        Ok((request, result))
    }

    async fn invoke_with_retry(&self, prompt: &PromptSpec) -> Result<RawModelOutput, LlmError> {
        let mut attempt = 0;
        loop {
            match self.model.invoke(prompt).await {
                Ok(raw) => return Ok(raw),
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt, &error);
                    attempt += 1;
                    warn!(
                        "LLM call failed ({error}); retry {attempt}/{} in {delay:?}",
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Tracks the current state of one run for logging.
struct Run {
    state: PipelineState,
}

impl Run {
    fn new() -> Self {
        Self {
            state: PipelineState::Received,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug!("{} -> {}", self.state, next);
        self.state = next;
    }
}
