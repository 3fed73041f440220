use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

use super::messages::{fallback_message, Language};
use super::rules::RuleSetError;

// ---------------------------------------------------------------------------
// RiskLevel
// ---------------------------------------------------------------------------

/// Ordinal severity of a symptom rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Self-care advice; no clinical note.
    #[default]
    Low,
    /// Worth mentioning to a doctor; clinical note generated.
    Medium,
    /// Seek care; clinical note generated.
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Whether a match at this level carries a clinical note.
    pub fn needs_clinical_note(&self) -> bool {
        matches!(self, Self::Medium | Self::High)
    }
}

// ---------------------------------------------------------------------------
// HealthRule
// ---------------------------------------------------------------------------

/// One curated symptom → advice mapping.
///
/// Field names on the wire follow the bundled JSON asset
/// (`symptoms`, `risk`, `advice`, `disease`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRule {
    /// Synonymous or related presentations, in priority order.
    #[serde(rename = "symptoms", alias = "symptomPhrases")]
    pub symptom_phrases: Vec<String>,
    #[serde(rename = "risk", alias = "riskLevel")]
    pub risk_level: RiskLevel,
    /// Shown to the user verbatim.
    pub advice: String,
    /// Suspected condition category, not a diagnosis.
    #[serde(rename = "disease", alias = "diseaseLabel", default, skip_serializing_if = "Option::is_none")]
    pub disease_label: Option<String>,
}

impl HealthRule {
    pub fn new(phrases: &[&str], risk_level: RiskLevel, advice: &str) -> Self {
        Self {
            symptom_phrases: phrases.iter().map(|p| p.to_string()).collect(),
            risk_level,
            advice: advice.to_string(),
            disease_label: None,
        }
    }

    pub fn with_disease(mut self, label: &str) -> Self {
        self.disease_label = Some(label.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// PatientContext
// ---------------------------------------------------------------------------

/// Display strings the caller supplies for the clinical note.
/// Never interpreted or validated by the matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    /// Last known wellness/immunity score, as the caller displays it.
    pub last_score: Option<String>,
}

impl PatientContext {
    /// "name, age, gender" with missing fields as "-".
    pub fn descriptor(&self) -> String {
        [&self.name, &self.age, &self.gender]
            .iter()
            .map(|field| field.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or("-"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// MatchResult
// ---------------------------------------------------------------------------

/// Which rule won and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    /// Position of the winning rule in the rule set.
    pub rule_index: usize,
    /// The phrase that produced the best score.
    pub matched_phrase: String,
    /// Best phrase similarity, in [0, 1].
    pub score: f64,
}

/// Outcome of one offline query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Matched rule's advice, or the fallback message.
    pub response_text: String,
    /// `Low` for the fallback.
    pub risk_level: RiskLevel,
    pub disease_label: Option<String>,
    /// Present only for Medium/High matches.
    pub clinical_note: Option<String>,
    /// `None` for the fallback.
    pub matched: Option<MatchDetail>,
    /// Always true; lets the chat layer tag the message source.
    pub is_offline_response: bool,
}

impl MatchResult {
    /// The generic low-risk, no-match response.
    pub fn fallback(lang: Language) -> Self {
        Self {
            response_text: fallback_message(lang).to_string(),
            risk_level: RiskLevel::Low,
            disease_label: None,
            clinical_note: None,
            matched: None,
            is_offline_response: true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }
}

// ---------------------------------------------------------------------------
// OfflineError
// ---------------------------------------------------------------------------

/// Errors surfaced while composing the offline feature.
/// Matching itself never fails.
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Rule set error: {0}")]
    RuleSet(#[from] RuleSetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Matcher task failed: {0}")]
    TaskJoin(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
