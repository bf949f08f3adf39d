//! Supported resume languages and a lightweight detector for the input text.

use serde::{Deserialize, Serialize};

/// Languages the service reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Ar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::De, Language::Ar];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Ar => "ar",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::De => "German (Deutsch)",
            Language::Ar => "Arabic (العربية)",
        }
    }

    /// Case-insensitive lookup by ISO 639-1 code.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    pub fn is_right_to_left(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

const GERMAN_MARKERS: &[&str] = &[
    "und", "der", "die", "das", "mit", "für", "bei", "ich", "ist", "von", "zu", "den", "im",
    "eine", "ein", "als", "auf", "nicht", "sowie", "berufserfahrung", "ausbildung",
    "kenntnisse", "sprachen",
];

const ENGLISH_MARKERS: &[&str] = &[
    "and", "the", "with", "for", "of", "to", "a", "an", "as", "at", "on", "is", "experience",
    "education", "skills", "languages",
];

fn is_arabic(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

/// Guesses the resume language among the supported set. Defaults to English.
///
/// Arabic wins when at least a fifth of the letters are Arabic script;
/// otherwise German and English stopword hits are compared, with umlauts and
/// `ß` counting toward German.
pub fn detect_language(text: &str) -> Language {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        return Language::En;
    }
    let arabic = text.chars().filter(|&c| is_arabic(c)).count();
    if arabic * 5 >= letters {
        return Language::Ar;
    }

    let mut german = 0usize;
    let mut english = 0usize;
    for word in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if GERMAN_MARKERS.contains(&word.as_str()) {
            german += 1;
        }
        if ENGLISH_MARKERS.contains(&word.as_str()) {
            english += 1;
        }
        if word.contains(['ä', 'ö', 'ü', 'ß']) {
            german += 1;
        }
    }

    if german > english {
        Language::De
    } else {
        Language::En
    }
}
