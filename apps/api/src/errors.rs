use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::validator::SchemaMismatch;
use crate::extraction::ExtractError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant maps to a stable `kind` identifier that the presentation
/// layer branches on; the message is free text meant for display.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable error kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Extract(ExtractError::UnsupportedFormat(_)) => "UnsupportedFormat",
            AppError::Extract(ExtractError::CorruptDocument(_)) => "CorruptDocument",
            AppError::Extract(ExtractError::EmptyContent) => "EmptyContent",
            AppError::Validation(_) => "ValidationError",
            AppError::Llm(LlmError::UpstreamTimeout { .. }) => "UpstreamTimeout",
            AppError::Llm(LlmError::RateLimited { .. }) => "RateLimited",
            AppError::Llm(LlmError::UpstreamError { .. }) => "UpstreamError",
            AppError::SchemaMismatch(_) => "SchemaMismatch",
            AppError::Internal(_) => "Internal",
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Extract(ExtractError::UnsupportedFormat(_)) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            AppError::Extract(ExtractError::CorruptDocument(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_DOCUMENT")
            }
            AppError::Extract(ExtractError::EmptyContent) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CONTENT")
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Llm(LlmError::UpstreamTimeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT")
            }
            AppError::Llm(LlmError::RateLimited { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "RATE_LIMITED")
            }
            AppError::Llm(LlmError::UpstreamError { .. }) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            AppError::SchemaMismatch(_) => (StatusCode::BAD_GATEWAY, "SCHEMA_MISMATCH"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message safe to show to the end user.
    fn public_message(&self) -> String {
        match self {
            AppError::Extract(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Llm(LlmError::UpstreamTimeout { .. }) => {
                "The AI service did not respond in time. Please try again.".to_string()
            }
            AppError::Llm(LlmError::RateLimited { .. }) => {
                "The AI service is busy. Please try again shortly.".to_string()
            }
            AppError::Llm(LlmError::UpstreamError { .. }) => {
                "The AI service returned an error.".to_string()
            }
            AppError::SchemaMismatch(e) => format!(
                "The AI response did not match the expected '{}' format.",
                e.schema
            ),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            AppError::Llm(e) => tracing::error!("LLM error: {e}"),
            AppError::SchemaMismatch(e) => tracing::error!("Schema mismatch: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "code": code,
                "message": self.public_message()
            }
        }));

        (status, body).into_response()
    }
}
