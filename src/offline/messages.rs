//! Patient-facing text for the offline matcher, in Turkish and English.

use serde::{Deserialize, Serialize};

use super::types::RiskLevel;

/// Language of fallback text, risk labels and clinical-note headings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Tr,
    En,
}

impl Language {
    /// Parse a language code. Unknown codes fall back to Turkish.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Self::En,
            _ => Self::Tr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::En => "en",
        }
    }
}

/// Fallback message when no rule clears the threshold.
pub const FALLBACK_MESSAGE: &str =
    "Şikayetinizi çevrimdışı kural setiyle eşleştiremedim. \
     Lütfen daha ayrıntılı yazın ya da çevrimiçi moda geçerek tekrar deneyin.";

/// Fallback message in the given language.
pub fn fallback_message(lang: Language) -> &'static str {
    match lang {
        Language::Tr => FALLBACK_MESSAGE,
        Language::En => {
            "I could not match your complaint against the offline rule set. \
             Please describe it in more detail or switch to online mode and try again."
        }
    }
}

/// Display label for a risk level.
pub fn risk_label(risk: RiskLevel, lang: Language) -> &'static str {
    match (lang, risk) {
        (Language::Tr, RiskLevel::Low) => "Düşük",
        (Language::Tr, RiskLevel::Medium) => "Orta",
        (Language::Tr, RiskLevel::High) => "Yüksek",
        (Language::En, RiskLevel::Low) => "Low",
        (Language::En, RiskLevel::Medium) => "Medium",
        (Language::En, RiskLevel::High) => "High",
    }
}

/// Headings used in the clinical note block.
pub struct NoteLabels {
    pub title: &'static str,
    pub date: &'static str,
    pub patient: &'static str,
    pub last_score: &'static str,
    pub complaint: &'static str,
    pub matched: &'static str,
    pub similarity: &'static str,
    pub risk: &'static str,
    pub disease: &'static str,
}

pub fn note_labels(lang: Language) -> NoteLabels {
    match lang {
        Language::Tr => NoteLabels {
            title: "--- DOKTOR NOTU ---",
            date: "Tarih",
            patient: "Hasta",
            last_score: "Son skor",
            complaint: "Şikayet",
            matched: "Eşleşen belirti",
            similarity: "Benzerlik",
            risk: "Risk",
            disease: "Olası durum",
        },
        Language::En => NoteLabels {
            title: "--- NOTE FOR YOUR DOCTOR ---",
            date: "Date",
            patient: "Patient",
            last_score: "Last score",
            complaint: "Complaint",
            matched: "Matched symptom",
            similarity: "Similarity",
            risk: "Risk",
            disease: "Possible condition",
        },
    }
}
