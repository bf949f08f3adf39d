//! Improvement summary derived from a validated analysis. Computed locally so
//! the numbers always agree with the scores the model reported.

use serde::Serialize;

use crate::analysis::language::Language;
use crate::analysis::schema::AnalysisResult;

/// ATS score a rewrite aims for.
pub const TARGET_ATS_SCORE: u32 = 90;

/// Hints attached while the estimated score is below the target.
const MISSING_FOR_TARGET: &[&str] = &[
    "Quantifiable metrics (e.g. 'Improved efficiency by 30%', 'Managed a team of 5 engineers')",
    "Specific numbers (e.g. 'Served 10,000+ users daily', 'Generated $2M in revenue')",
    "Measurable achievements (e.g. 'Reduced costs by 25%', 'Raised customer satisfaction by 40%')",
    "Project scope details (e.g. 'Led 3 major projects over 6 months', 'Delivered to 50+ clients')",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImprovementsSummary {
    pub ats_score_before: u32,
    pub ats_score_after: u32,
    pub target_ats_score: u32,
    pub gap_to_target: u32,
    pub improvements_made: Vec<String>,
    pub translation_applied: bool,
    pub input_language: Language,
    pub output_language: Language,
    pub missing_for_target: Vec<String>,
}

pub fn summarize(
    result: &AnalysisResult,
    input_language: Language,
    output_language: Language,
) -> ImprovementsSummary {
    let before = result.ats_compliance.overall_score;
    let after = result.estimated_new_ats_score;
    let translation_applied = input_language != output_language;

    let mut improvements_made = Vec::new();
    if translation_applied {
        improvements_made.push(format!(
            "Translated CV from {} to {}",
            input_language.display_name(),
            output_language.display_name()
        ));
    }
    improvements_made.push("Rewrote professional summary with action verbs and context".to_string());

    let experience = result.rewritten_cv.experience.len();
    if experience > 0 {
        improvements_made.push(format!(
            "Enhanced {experience} experience {} with impact and scope",
            if experience == 1 { "entry" } else { "entries" }
        ));
    }

    let suggested = result.suggested_skills.len();
    if suggested > 0 {
        improvements_made.push(format!("Suggested {suggested} additional skills"));
    }

    let delta = i64::from(after) - i64::from(before);
    improvements_made.push(format!(
        "ATS compliance estimate moved from {before}% to {after}% ({delta:+}%)"
    ));

    let missing_for_target = if after < TARGET_ATS_SCORE {
        MISSING_FOR_TARGET.iter().map(|s| s.to_string()).collect()
    } else {
        Vec::new()
    };

    ImprovementsSummary {
        ats_score_before: before,
        ats_score_after: after,
        target_ats_score: TARGET_ATS_SCORE,
        gap_to_target: TARGET_ATS_SCORE.saturating_sub(after),
        improvements_made,
        translation_applied,
        input_language,
        output_language,
        missing_for_target,
    }
}
