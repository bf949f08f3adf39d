//! Structured results the model must produce. Deserializing into these types
//! is the strict half of validation; `validator` adds the field-level checks.

use serde::{Deserialize, Deserializer, Serialize};

use crate::analysis::language::Language;
use crate::analysis::style::TemplateStyle;

/// Models emit `null` for empty lists often enough that it is accepted as `[]`.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// analysis_result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rewritten_cv: RewrittenCv,
    pub quality_report: QualityReport,
    pub ats_compliance: AtsComplianceReport,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub suggested_skills: Vec<String>,
    pub estimated_new_ats_score: u32,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenCv {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub summary: String,
    #[serde(deserialize_with = "nullable_vec")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub experience: Vec<RewrittenExperience>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub languages: Vec<LanguageSkill>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub hobbies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenExperience {
    pub position: String,
    pub company: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub original_description: String,
    pub rewritten_description: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<String>,
    #[serde(default)]
    pub metrics: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsCheck {
    pub item: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsComplianceReport {
    pub overall_score: u32,
    #[serde(deserialize_with = "nullable_vec")]
    pub passed_checks: Vec<AtsCheck>,
    #[serde(deserialize_with = "nullable_vec")]
    pub failed_checks: Vec<AtsCheck>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub critical_issues: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub output_language: Language,
    pub template_style: TemplateStyle,
    pub tailored_to_job: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// career_recommendation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRecommendation {
    pub careers: Vec<CareerSuggestion>,
    #[serde(default)]
    pub summary: String,
    pub metadata: CareerMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerSuggestion {
    pub rank: u32,
    pub title: String,
    pub confidence: u32,
    pub rationale: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub matching_skills: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub skills_to_develop: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerMetadata {
    pub output_language: Language,
}
