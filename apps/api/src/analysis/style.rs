//! Template styles: the fixed set of rewrite styles a client may request,
//! each mapped to the writing guidance sent to the model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateStyle {
    #[default]
    ProfessionalBlue,
    ModernMinimal,
    Classic,
    Creative,
    Executive,
    Academic,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 6] = [
        TemplateStyle::ProfessionalBlue,
        TemplateStyle::ModernMinimal,
        TemplateStyle::Classic,
        TemplateStyle::Creative,
        TemplateStyle::Executive,
        TemplateStyle::Academic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStyle::ProfessionalBlue => "professional-blue",
            TemplateStyle::ModernMinimal => "modern-minimal",
            TemplateStyle::Classic => "classic",
            TemplateStyle::Creative => "creative",
            TemplateStyle::Executive => "executive",
            TemplateStyle::Academic => "academic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for TemplateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writing guidance for one template style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleGuide {
    pub tone: &'static str,
    pub summary_sentences: (u8, u8),
    pub bullets_per_role: (u8, u8),
    pub emphasis: &'static str,
}

pub fn get_style_guide(style: TemplateStyle) -> StyleGuide {
    match style {
        TemplateStyle::ProfessionalBlue => StyleGuide {
            tone: "confident, corporate and polished",
            summary_sentences: (3, 4),
            bullets_per_role: (3, 5),
            emphasis: "measurable results, core competencies and ATS keywords",
        },
        TemplateStyle::ModernMinimal => StyleGuide {
            tone: "direct and concise, no filler words",
            summary_sentences: (2, 3),
            bullets_per_role: (2, 4),
            emphasis: "the strongest achievements only; short scannable bullets",
        },
        TemplateStyle::Classic => StyleGuide {
            tone: "formal and conservative",
            summary_sentences: (3, 4),
            bullets_per_role: (3, 5),
            emphasis: "responsibilities, tenure and steady career progression",
        },
        TemplateStyle::Creative => StyleGuide {
            tone: "energetic and personal while staying professional",
            summary_sentences: (2, 4),
            bullets_per_role: (3, 4),
            emphasis: "projects, portfolio work and distinctive contributions",
        },
        TemplateStyle::Executive => StyleGuide {
            tone: "strategic and authoritative",
            summary_sentences: (4, 5),
            bullets_per_role: (3, 5),
            emphasis: "leadership scope, business impact, budgets and team size",
        },
        TemplateStyle::Academic => StyleGuide {
            tone: "precise and scholarly",
            summary_sentences: (3, 5),
            bullets_per_role: (2, 4),
            emphasis: "research, publications, teaching and methodology",
        },
    }
}

impl StyleGuide {
    /// Renders the guide as an instruction paragraph.
    pub fn to_instruction(&self) -> String {
        format!(
            "Tone: {}. Professional summary: {}-{} sentences. Experience: {}-{} bullet points per role. Emphasize {}.",
            self.tone,
            self.summary_sentences.0,
            self.summary_sentences.1,
            self.bullets_per_role.0,
            self.bullets_per_role.1,
            self.emphasis,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_names_round_trip() {
        for style in TemplateStyle::ALL {
            assert_eq!(TemplateStyle::from_name(style.as_str()), Some(style));
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.as_str()));
        }
    }

    #[test]
    fn test_unknown_style_rejected() {
        assert_eq!(TemplateStyle::from_name("ignore previous instructions"), None);
        assert_eq!(TemplateStyle::from_name("professional_blue"), None);
    }

    #[test]
    fn test_default_is_professional_blue() {
        assert_eq!(TemplateStyle::default(), TemplateStyle::ProfessionalBlue);
    }

    #[test]
    fn test_minimal_is_shorter_than_executive() {
        let minimal = get_style_guide(TemplateStyle::ModernMinimal);
        let executive = get_style_guide(TemplateStyle::Executive);
        assert!(minimal.summary_sentences.1 < executive.summary_sentences.1);
    }

    #[test]
    fn test_instruction_mentions_emphasis() {
        let guide = get_style_guide(TemplateStyle::Academic);
        assert!(guide.to_instruction().contains("publications"));
    }
}
