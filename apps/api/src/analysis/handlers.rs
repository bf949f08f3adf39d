use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use tracing::debug;

use crate::analysis::pipeline::AnalysisResponse;
use crate::analysis::request::{RawAnalysisParams, SOCIAL_LINK_RULES};
use crate::analysis::schema::CareerRecommendation;
use crate::errors::AppError;
use crate::extraction::RawUpload;
use crate::state::AppState;

/// POST /analyze-and-rewrite
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let (upload, mut params) = read_form(multipart).await?;
    params.limit = None;
    let response = state.pipeline.analyze_and_rewrite(upload, params).await?;
    Ok(Json(response))
}

/// POST /recommend-careers
pub async fn handle_recommend(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CareerRecommendation>, AppError> {
    let (upload, params) = read_form(multipart).await?;
    let recommendation = state.pipeline.recommend_careers(upload, params).await?;
    Ok(Json(recommendation))
}

/// Collects the document and the raw parameters from a multipart form.
///
/// Exactly one of `cv_file` (or `file`) and `cv_text` must carry content.
/// Unknown fields are skipped.
async fn read_form(mut multipart: Multipart) -> Result<(RawUpload, RawAnalysisParams), AppError> {
    let mut file: Option<RawUpload> = None;
    let mut pasted: Option<String> = None;
    let mut params = RawAnalysisParams::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv_file" | "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers submit an empty part for an untouched file input.
                if bytes.is_empty() && filename.is_empty() {
                    continue;
                }
                if file.is_some() {
                    return Err(AppError::Validation(
                        "Only one CV file may be uploaded".to_string(),
                    ));
                }
                file = Some(RawUpload {
                    bytes,
                    filename,
                    content_type,
                });
            }
            "cv_text" => {
                let text = field.text().await.map_err(multipart_error)?;
                pasted = Some(text).filter(|t| !t.trim().is_empty());
            }
            "output_language" => params.output_language = Some(read_text(field).await?),
            "template_style" => params.template_style = Some(read_text(field).await?),
            "target_job_description" | "job_description" => {
                params.target_job_description = Some(read_text(field).await?)
            }
            "locale_hint" | "location" => params.locale_hint = Some(read_text(field).await?),
            "limit" => params.limit = Some(read_text(field).await?),
            link if SOCIAL_LINK_RULES.iter().any(|(rule, _)| *rule == link) => {
                let value = read_text(field).await?;
                params.social_links.insert(link.to_string(), value);
            }
            _ => debug!("Ignoring unknown form field '{name}'"),
        }
    }

    let upload = match (file, pasted) {
        (Some(upload), None) => upload,
        (None, Some(text)) => RawUpload::from_pasted_text(text),
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Provide either cv_file or cv_text, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "A CV is required: upload cv_file or paste cv_text".to_string(),
            ))
        }
    };

    Ok((upload, params))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart request: {}", e.body_text()))
}
