//! Request normalization: validates and defaults client parameters into an
//! `AnalysisRequest` before any model call is made.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::language::Language;
use crate::analysis::style::TemplateStyle;
use crate::errors::AppError;
use crate::extraction::ExtractedText;

pub const MAX_JOB_DESCRIPTION_CHARS: usize = 20_000;
pub const MAX_LOCALE_HINT_CHARS: usize = 120;
pub const DEFAULT_CAREER_LIMIT: usize = 5;
pub const MAX_CAREER_LIMIT: usize = 10;

/// Accepted social/professional link fields and the host fragments each must contain.
pub const SOCIAL_LINK_RULES: &[(&str, &[&str])] = &[
    ("github", &["github.com"]),
    ("linkedin", &["linkedin.com"]),
    ("kaggle", &["kaggle.com"]),
    ("portfolio", &["http", ".com", ".io", ".dev", ".net", ".org"]),
    ("stackoverflow", &["stackoverflow.com"]),
    ("medium", &["medium.com"]),
    ("twitter", &["twitter.com", "x.com"]),
];

/// Parameters as they arrive from the client. Every field is untrusted text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAnalysisParams {
    pub output_language: Option<String>,
    pub template_style: Option<String>,
    pub target_job_description: Option<String>,
    pub locale_hint: Option<String>,
    pub limit: Option<String>,
    pub social_links: BTreeMap<String, String>,
}

/// Validated links, keyed by field name. Echoed back to the client, never sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SocialLinks(BTreeMap<String, String>);

#[cfg(test)]
impl SocialLinks {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fully validated request. Every field holds a known-good value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub extracted_text: ExtractedText,
    pub output_language: Language,
    pub template_style: TemplateStyle,
    pub target_job_description: Option<String>,
    pub locale_hint: Option<String>,
    pub career_limit: usize,
    pub social_links: SocialLinks,
}

impl From<&AnalysisRequest> for RawAnalysisParams {
    fn from(request: &AnalysisRequest) -> Self {
        Self {
            output_language: Some(request.output_language.code().to_string()),
            template_style: Some(request.template_style.as_str().to_string()),
            target_job_description: request.target_job_description.clone(),
            locale_hint: request.locale_hint.clone(),
            limit: Some(request.career_limit.to_string()),
            social_links: request.social_links.0.clone(),
        }
    }
}

/// Validates raw parameters against the extracted resume text.
///
/// A missing `output_language` defaults to English; a supplied but unknown
/// one is rejected. Blank optional fields are treated as absent.
pub fn normalize(
    extracted_text: ExtractedText,
    raw: RawAnalysisParams,
) -> Result<AnalysisRequest, AppError> {
    let output_language = match non_blank(raw.output_language) {
        None => Language::default(),
        Some(code) => Language::from_code(&code).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid output_language '{code}'. Supported: {}",
                Language::ALL.map(|l| l.code()).join(", ")
            ))
        })?,
    };

    let template_style = match non_blank(raw.template_style) {
        None => TemplateStyle::default(),
        Some(name) => TemplateStyle::from_name(&name).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid template_style. Supported: {}",
                TemplateStyle::ALL.map(|s| s.as_str()).join(", ")
            ))
        })?,
    };

    let target_job_description = bounded_text(
        raw.target_job_description,
        "target_job_description",
        MAX_JOB_DESCRIPTION_CHARS,
    )?;
    let locale_hint = bounded_text(raw.locale_hint, "locale_hint", MAX_LOCALE_HINT_CHARS)?;

    let career_limit = match non_blank(raw.limit) {
        None => DEFAULT_CAREER_LIMIT,
        Some(value) => value
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=MAX_CAREER_LIMIT).contains(n))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "limit must be a whole number between 1 and {MAX_CAREER_LIMIT}"
                ))
            })?,
    };

    let social_links = normalize_social_links(raw.social_links)?;

    Ok(AnalysisRequest {
        extracted_text,
        output_language,
        template_style,
        target_job_description,
        locale_hint,
        career_limit,
        social_links,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bounded_text(
    value: Option<String>,
    field: &str,
    max_chars: usize,
) -> Result<Option<String>, AppError> {
    let Some(text) = non_blank(value) else {
        return Ok(None);
    };
    if text.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} exceeds the maximum length of {max_chars} characters"
        )));
    }
    Ok(Some(text))
}

fn normalize_social_links(raw: BTreeMap<String, String>) -> Result<SocialLinks, AppError> {
    let mut links = BTreeMap::new();
    for (field, value) in raw {
        let Some((_, hosts)) = SOCIAL_LINK_RULES.iter().find(|(name, _)| *name == field) else {
            return Err(AppError::Validation(format!("Unknown link field '{field}'")));
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let lower = value.to_lowercase();
        if !hosts.iter().any(|host| lower.contains(host)) {
            return Err(AppError::Validation(format!(
                "Invalid {field} URL. Must contain {}",
                hosts.join(" or ")
            )));
        }
        links.insert(field, value.to_string());
    }
    Ok(SocialLinks(links))
}
