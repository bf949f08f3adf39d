//! Response Validator: the only boundary between raw model text and typed
//! results.
//!
//! 1. Strict parse of the raw output against the expected schema.
//! 2. On failure, one repair pass: strip code fences and surrounding prose,
//!    then parse again.
//! 3. Field-level checks (score ranges, enum echoes, rank order).
//!
//! Anything that fails is a `SchemaMismatch`; nothing is defaulted or
//! partially returned.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::prompt_builder::SchemaName;
use crate::analysis::request::AnalysisRequest;
use crate::analysis::schema::{AnalysisResult, CareerRecommendation, CheckStatus};
use crate::llm_client::RawModelOutput;

const MAX_SCORE: u32 = 100;
/// Raw output is cut to this many characters when logged.
const MAX_LOGGED_OUTPUT_CHARS: usize = 2000;

#[derive(Debug, Error)]
#[error("model output does not match schema '{schema}': {reason}")]
pub struct SchemaMismatch {
    pub schema: SchemaName,
    pub reason: String,
    /// Kept for diagnostics only; never sent to the client.
    pub raw_output: String,
}

/// A result type the model can be asked to produce.
pub trait ModelSchema: DeserializeOwned {
    const SCHEMA: SchemaName;

    /// Pushes a description of every contract violation onto `issues`.
    fn check(&self, request: &AnalysisRequest, issues: &mut Vec<String>);

    /// Canonicalizes a result that passed `check`.
    fn finish(self, _request: &AnalysisRequest) -> Self {
        self
    }
}

pub fn validate<T: ModelSchema>(
    raw: &RawModelOutput,
    request: &AnalysisRequest,
) -> Result<T, SchemaMismatch> {
    let mismatch = |reason: String| {
        let logged: String = raw.as_str().chars().take(MAX_LOGGED_OUTPUT_CHARS).collect();
        warn!(schema = %T::SCHEMA, "Model output rejected: {reason}; raw output: {logged}");
        SchemaMismatch {
            schema: T::SCHEMA,
            reason,
            raw_output: raw.as_str().to_string(),
        }
    };

    let parsed: T = parse_with_repair(raw.as_str()).map_err(mismatch)?;

    let mut issues = Vec::new();
    parsed.check(request, &mut issues);
    if !issues.is_empty() {
        return Err(mismatch(issues.join("; ")));
    }

    Ok(parsed.finish(request))
}

fn parse_with_repair<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let strict_error = match serde_json::from_str::<T>(raw.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let repaired = repair(raw)
        .ok_or_else(|| format!("no JSON object found in output ({strict_error})"))?;
    debug!("Strict parse failed ({strict_error}); retrying on repaired output");

    serde_json::from_str::<T>(repaired)
        .map_err(|e| format!("output is invalid even after repair: {e}"))
}

/// Best-effort recovery of the JSON object from near-miss output: the first
/// fenced block if it holds an object, otherwise the first object anywhere.
fn repair(raw: &str) -> Option<&str> {
    strip_code_fences(raw)
        .and_then(extract_json_object)
        .or_else(|| extract_json_object(raw))
}

/// Returns the contents of the first markdown code fence, with or without a
/// language tag. An unclosed fence runs to the end of the text.
fn strip_code_fences(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_open = &text[start + 3..];
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim())
}

/// Slices out the first balanced `{ ... }`, ignoring braces inside strings.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_score(field: &str, score: u32, issues: &mut Vec<String>) {
    if score > MAX_SCORE {
        issues.push(format!("{field} is {score}, expected 0..={MAX_SCORE}"));
    }
}

fn check_not_blank(field: &str, value: &str, issues: &mut Vec<String>) {
    if value.trim().is_empty() {
        issues.push(format!("{field} must not be empty"));
    }
}

impl ModelSchema for AnalysisResult {
    const SCHEMA: SchemaName = SchemaName::AnalysisResult;

    fn check(&self, request: &AnalysisRequest, issues: &mut Vec<String>) {
        if self.metadata.output_language != request.output_language {
            issues.push(format!(
                "metadata.output_language is '{}', requested '{}'",
                self.metadata.output_language, request.output_language
            ));
        }
        if self.metadata.template_style != request.template_style {
            issues.push(format!(
                "metadata.template_style is '{}', requested '{}'",
                self.metadata.template_style, request.template_style
            ));
        }
        let tailored = request.target_job_description.is_some();
        if self.metadata.tailored_to_job != tailored {
            issues.push(format!(
                "metadata.tailored_to_job is {}, expected {tailored}",
                self.metadata.tailored_to_job
            ));
        }

        check_not_blank("rewritten_cv.summary", &self.rewritten_cv.summary, issues);
        for (i, entry) in self.rewritten_cv.experience.iter().enumerate() {
            check_not_blank(
                &format!("rewritten_cv.experience[{i}].rewritten_description"),
                &entry.rewritten_description,
                issues,
            );
        }

        check_score("quality_report.overall_score", self.quality_report.overall_score, issues);
        check_score("ats_compliance.overall_score", self.ats_compliance.overall_score, issues);
        check_score("estimated_new_ats_score", self.estimated_new_ats_score, issues);

        for (list, expected, checks) in [
            ("passed_checks", CheckStatus::Pass, &self.ats_compliance.passed_checks),
            ("failed_checks", CheckStatus::Fail, &self.ats_compliance.failed_checks),
        ] {
            for (i, check) in checks.iter().enumerate() {
                if check.status != expected {
                    issues.push(format!(
                        "ats_compliance.{list}[{i}].status is {:?}, expected {expected:?}",
                        check.status
                    ));
                }
            }
        }
    }
}

impl ModelSchema for CareerRecommendation {
    const SCHEMA: SchemaName = SchemaName::CareerRecommendation;

    fn check(&self, request: &AnalysisRequest, issues: &mut Vec<String>) {
        if self.metadata.output_language != request.output_language {
            issues.push(format!(
                "metadata.output_language is '{}', requested '{}'",
                self.metadata.output_language, request.output_language
            ));
        }
        if self.careers.is_empty() {
            issues.push("careers must contain at least one entry".to_string());
        }

        let mut ranks: Vec<u32> = self.careers.iter().map(|c| c.rank).collect();
        ranks.sort_unstable();
        if ranks.iter().zip(1..).any(|(&rank, expected)| rank != expected) {
            issues.push(format!("career ranks {ranks:?} are not consecutive from 1"));
        }

        for (i, career) in self.careers.iter().enumerate() {
            check_not_blank(&format!("careers[{i}].title"), &career.title, issues);
            check_not_blank(&format!("careers[{i}].rationale"), &career.rationale, issues);
            check_score(&format!("careers[{i}].confidence"), career.confidence, issues);
        }
    }

    /// Orders careers by rank and drops those beyond the requested limit.
    fn finish(mut self, request: &AnalysisRequest) -> Self {
        self.careers.sort_by_key(|c| c.rank);
        self.careers.truncate(request.career_limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{analysis_json, careers_json};
    use crate::analysis::language::Language;
    use crate::analysis::request::{normalize, RawAnalysisParams};
    use crate::extraction::ExtractedText;

    fn request(raw: RawAnalysisParams) -> AnalysisRequest {
        let text = ExtractedText::new("John Doe, Software Engineer, 5 years Python").unwrap();
        normalize(text, raw).unwrap()
    }

    fn english() -> AnalysisRequest {
        request(RawAnalysisParams::default())
    }

    fn raw(text: impl Into<String>) -> RawModelOutput {
        RawModelOutput::new(text)
    }

    #[test]
    fn test_strict_json_validates() {
        let output = raw(analysis_json("en", "professional-blue", false));
        let result: AnalysisResult = validate(&output, &english()).unwrap();
        assert_eq!(result.metadata.output_language, Language::En);
    }

    #[test]
    fn test_prose_and_fence_repaired() {
        let output = raw(format!(
            "Sure! Here's the JSON: ```json {} ```",
            analysis_json("en", "professional-blue", false)
        ));
        let result: AnalysisResult = validate(&output, &english()).unwrap();
        assert_eq!(result.quality_report.overall_score, 45);
    }

    #[test]
    fn test_fenced_block_on_own_lines_repaired() {
        let output = raw(format!(
            "```json\n{}\n```",
            analysis_json("en", "professional-blue", false)
        ));
        assert!(validate::<AnalysisResult>(&output, &english()).is_ok());
    }

    #[test]
    fn test_trailing_prose_without_fence_repaired() {
        let output = raw(format!(
            "{}\n\nLet me know if you need anything else!",
            analysis_json("en", "professional-blue", false)
        ));
        assert!(validate::<AnalysisResult>(&output, &english()).is_ok());
    }

    #[test]
    fn test_inline_fence_in_prose_before_object_repaired() {
        let output = raw(format!(
            "Note: I used ```this``` before.\n{}",
            analysis_json("en", "professional-blue", false)
        ));
        assert!(validate::<AnalysisResult>(&output, &english()).is_ok());
    }

    #[test]
    fn test_fence_inside_string_value_repaired() {
        let mut value: serde_json::Value =
            serde_json::from_str(&analysis_json("en", "professional-blue", false)).unwrap();
        value["rewritten_cv"]["summary"] = serde_json::json!("Uses ```rust``` daily");
        let output = raw(format!("Here it is: {value}"));
        let result: AnalysisResult = validate(&output, &english()).unwrap();
        assert_eq!(result.rewritten_cv.summary, "Uses ```rust``` daily");
    }

    #[test]
    fn test_non_json_is_schema_mismatch() {
        let err = validate::<AnalysisResult>(&raw("I cannot help with that."), &english())
            .unwrap_err();
        assert_eq!(err.schema, SchemaName::AnalysisResult);
        assert_eq!(err.raw_output, "I cannot help with that.");
    }

    #[test]
    fn test_empty_output_is_schema_mismatch() {
        assert!(validate::<AnalysisResult>(&raw(""), &english()).is_err());
    }

    #[test]
    fn test_language_echo_must_match_request() {
        let output = raw(analysis_json("de", "professional-blue", false));
        let err = validate::<AnalysisResult>(&output, &english()).unwrap_err();
        assert!(err.reason.contains("output_language"));
    }

    #[test]
    fn test_style_echo_must_match_request() {
        let output = raw(analysis_json("en", "creative", false));
        let err = validate::<AnalysisResult>(&output, &english()).unwrap_err();
        assert!(err.reason.contains("template_style"));
    }

    #[test]
    fn test_tailoring_flag_must_match_request() {
        let tailored = request(RawAnalysisParams {
            target_job_description: Some("Platform Engineer".to_string()),
            ..Default::default()
        });
        let output = raw(analysis_json("en", "professional-blue", false));
        let err = validate::<AnalysisResult>(&output, &tailored).unwrap_err();
        assert!(err.reason.contains("tailored_to_job"));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&analysis_json("en", "professional-blue", false)).unwrap();
        value["estimated_new_ats_score"] = serde_json::json!(140);
        let err = validate::<AnalysisResult>(&raw(value.to_string()), &english()).unwrap_err();
        assert!(err.reason.contains("estimated_new_ats_score"));
    }

    #[test]
    fn test_failed_check_in_passed_list_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&analysis_json("en", "professional-blue", false)).unwrap();
        value["ats_compliance"]["passed_checks"][0]["status"] = serde_json::json!("fail");
        let err = validate::<AnalysisResult>(&raw(value.to_string()), &english()).unwrap_err();
        assert!(err.reason.contains("passed_checks[0]"));
    }

    #[test]
    fn test_blank_summary_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&analysis_json("en", "professional-blue", false)).unwrap();
        value["rewritten_cv"]["summary"] = serde_json::json!("  ");
        assert!(validate::<AnalysisResult>(&raw(value.to_string()), &english()).is_err());
    }

    #[test]
    fn test_careers_sorted_and_limited() {
        let limited = request(RawAnalysisParams {
            limit: Some("2".to_string()),
            ..Default::default()
        });
        let mut value: serde_json::Value = serde_json::from_str(&careers_json("en", 3)).unwrap();
        value["careers"].as_array_mut().unwrap().reverse();
        let result: CareerRecommendation = validate(&raw(value.to_string()), &limited).unwrap();
        let ranks: Vec<u32> = result.careers.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_ranks_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&careers_json("en", 2)).unwrap();
        value["careers"][1]["rank"] = serde_json::json!(1);
        let err =
            validate::<CareerRecommendation>(&raw(value.to_string()), &english()).unwrap_err();
        assert!(err.reason.contains("ranks"));
    }

    #[test]
    fn test_empty_careers_rejected() {
        let output = raw(careers_json("en", 0));
        assert!(validate::<CareerRecommendation>(&output, &english()).is_err());
    }

    #[test]
    fn test_strip_code_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        assert_eq!(strip_code_fences("{\"key\": \"value\"}"), None);
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let input = r#"Result: {"a": "} not the end {", "b": {"c": "\"}"}} trailing"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"a": "} not the end {", "b": {"c": "\"}"}}"#)
        );
    }

    #[test]
    fn test_extract_json_object_unbalanced() {
        assert_eq!(extract_json_object("{\"a\": 1"), None);
    }
}
