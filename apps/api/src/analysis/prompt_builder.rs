//! Prompt Builder: turns a validated request into the exact system and user
//! messages sent to the model.
//!
//! Output is a pure function of `(AnalysisRequest, Operation)`: no clocks, no
//! randomness. Candidate-supplied text (resume, job description, location)
//! only ever appears in the user message, wrapped in document markers.

use serde::Serialize;

use crate::analysis::prompts::{
    ANALYSIS_SCHEMA_TEMPLATE, CAREER_SCHEMA_TEMPLATE, GENERAL_INSTRUCTION,
    RECOMMEND_LOCALE_INSTRUCTION, RECOMMEND_SYSTEM_TEMPLATE, RECOMMEND_TARGET_INSTRUCTION,
    REWRITE_LOCALE_INSTRUCTION, REWRITE_SYSTEM_TEMPLATE, TAILORING_INSTRUCTION,
};
use crate::analysis::request::AnalysisRequest;
use crate::analysis::style::get_style_guide;
use crate::llm_client::prompts::{
    JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION, UNTRUSTED_CONTENT_INSTRUCTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Rewrite,
    Recommend,
}

/// Names of the structured contracts the model must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaName {
    AnalysisResult,
    CareerRecommendation,
}

impl SchemaName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaName::AnalysisResult => "analysis_result",
            SchemaName::CareerRecommendation => "career_recommendation",
        }
    }
}

impl std::fmt::Display for SchemaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
    pub schema: SchemaName,
}

pub fn build(request: &AnalysisRequest, operation: Operation) -> PromptSpec {
    match operation {
        Operation::Rewrite => PromptSpec {
            system: rewrite_system(request),
            user: user_content(request),
            schema: SchemaName::AnalysisResult,
        },
        Operation::Recommend => PromptSpec {
            system: recommend_system(request),
            user: user_content(request),
            schema: SchemaName::CareerRecommendation,
        },
    }
}

fn rewrite_system(request: &AnalysisRequest) -> String {
    let language = request.output_language;
    let style = request.template_style;
    let tailored = request.target_job_description.is_some();

    let direction_note = if language.is_right_to_left() {
        " Write naturally for right-to-left reading; keep names, emails and URLs in their original script."
    } else {
        ""
    };
    let tailoring_instruction = if tailored {
        TAILORING_INSTRUCTION
    } else {
        GENERAL_INSTRUCTION
    };
    let locale_instruction = if request.locale_hint.is_some() {
        REWRITE_LOCALE_INSTRUCTION
    } else {
        ""
    };

    let schema = ANALYSIS_SCHEMA_TEMPLATE
        .replace("{language_code}", language.code())
        .replace("{style_name}", style.as_str())
        .replace("{tailored}", if tailored { "true" } else { "false" });

    let body = REWRITE_SYSTEM_TEMPLATE
        .replace("{language_name}", language.display_name())
        .replace("{direction_note}", direction_note)
        .replace("{style_name}", style.as_str())
        .replace("{style_guidance}", &get_style_guide(style).to_instruction())
        .replace("{tailoring_instruction}", tailoring_instruction)
        .replace("{locale_instruction}", locale_instruction)
        .replace("{schema}", &schema);

    assemble_system(&body)
}

fn recommend_system(request: &AnalysisRequest) -> String {
    let language = request.output_language;

    let mut context_instruction = String::new();
    if request.target_job_description.is_some() {
        context_instruction.push_str(RECOMMEND_TARGET_INSTRUCTION);
        context_instruction.push('\n');
    }
    if request.locale_hint.is_some() {
        context_instruction.push_str(RECOMMEND_LOCALE_INSTRUCTION);
        context_instruction.push('\n');
    }

    let schema = CAREER_SCHEMA_TEMPLATE.replace("{language_code}", language.code());

    let body = RECOMMEND_SYSTEM_TEMPLATE
        .replace("{language_name}", language.display_name())
        .replace("{limit}", &request.career_limit.to_string())
        .replace("{context_instruction}", context_instruction.trim_end())
        .replace("{schema}", &schema);

    assemble_system(&body)
}

fn assemble_system(body: &str) -> String {
    format!(
        "{body}\n\n{UNTRUSTED_CONTENT_INSTRUCTION}\n\n{NO_INVENTION_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}"
    )
}

fn user_content(request: &AnalysisRequest) -> String {
    let mut content = document_block("RESUME", request.extracted_text.as_str());
    if let Some(job) = &request.target_job_description {
        content.push_str("\n\n");
        content.push_str(&document_block("TARGET JOB DESCRIPTION", job));
    }
    if let Some(locale) = &request.locale_hint {
        content.push_str("\n\n");
        content.push_str(&document_block("CANDIDATE LOCATION", locale));
    }
    content
}

/// Wraps untrusted text in document markers. Marker-like runs inside the
/// text are broken up so a document cannot close its own block.
fn document_block(name: &str, text: &str) -> String {
    let neutralized = text.replace("===", "= = =");
    format!("=== BEGIN {name} ===\n{neutralized}\n=== END {name} ===")
}
