//! Canned model responses shared by tests.

use serde_json::json;

/// A schema-conformant `analysis_result` response.
pub(crate) fn analysis_json(language: &str, style: &str, tailored: bool) -> String {
    json!({
        "rewritten_cv": {
            "name": "John Doe",
            "email": null,
            "phone": null,
            "address": null,
            "summary": "Software engineer with five years of Python experience building reliable backend services.",
            "skills": ["Python", "REST APIs"],
            "experience": [{
                "position": "Software Engineer",
                "company": "Unknown",
                "duration": "5 years",
                "original_description": "Software Engineer, 5 years Python",
                "rewritten_description": "Developed and maintained Python services over five years, improving reliability for internal users.",
                "improvements": ["Added strong action verb", "Added scope"]
            }],
            "education": [],
            "projects": [],
            "languages": [],
            "hobbies": []
        },
        "quality_report": {
            "overall_score": 45,
            "strengths": ["Clear role"],
            "weaknesses": ["Very short"],
            "suggestions": ["Add contact details"]
        },
        "ats_compliance": {
            "overall_score": 50,
            "passed_checks": [{"item": "Skills section", "status": "pass", "details": "Python listed"}],
            "failed_checks": [{"item": "Contact information", "status": "fail", "details": "No email or phone"}],
            "critical_issues": ["Missing contact information"],
            "recommendations": ["Add an email address"]
        },
        "suggested_skills": ["Docker", "PostgreSQL", "FastAPI"],
        "estimated_new_ats_score": 72,
        "metadata": {
            "output_language": language,
            "template_style": style,
            "tailored_to_job": tailored
        }
    })
    .to_string()
}

/// A schema-conformant `career_recommendation` response with `count` careers.
pub(crate) fn careers_json(language: &str, count: u32) -> String {
    let careers: Vec<_> = (1..=count)
        .map(|rank| {
            json!({
                "rank": rank,
                "title": format!("Career {rank}"),
                "confidence": 90 - rank * 5,
                "rationale": "Matches five years of Python backend work.",
                "matching_skills": ["Python"],
                "skills_to_develop": ["Kubernetes"]
            })
        })
        .collect();
    json!({
        "careers": careers,
        "summary": "Backend-focused software engineer.",
        "metadata": {"output_language": language}
    })
    .to_string()
}
