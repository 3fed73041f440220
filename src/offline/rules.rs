use std::ops::Deref;
use std::path::Path;

use thiserror::Error;

use super::similarity::tokenize;
use super::types::{HealthRule, RiskLevel};

/// Bundled rule set, compiled into the binary.
const BUNDLED_RULES_JSON: &str = include_str!("../../resources/health_rules.json");

/// Rule-set loading and validation errors.
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Rule set read failed ({0}): {1}")]
    Read(String, String),

    #[error("Rule set parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Rule set is empty")]
    Empty,

    #[error("Invalid rule at index {index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// Immutable, ordered collection of health rules.
///
/// Loaded once at startup and shared by reference. Order is significant:
/// on equal scores the earlier rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<HealthRule>,
}

impl RuleSet {
    /// Build from rules already in memory, validating each one.
    pub fn new(rules: Vec<HealthRule>) -> Result<Self, RuleSetError> {
        validate(&rules)?;
        Ok(Self { rules })
    }

    /// Parse a JSON array of rule records.
    pub fn from_json_str(json: &str, source: &str) -> Result<Self, RuleSetError> {
        let rules: Vec<HealthRule> = serde_json::from_str(json)
            .map_err(|e| RuleSetError::Parse(source.to_string(), e.to_string()))?;
        Self::new(rules)
    }

    /// Load rules from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RuleSetError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| RuleSetError::Read(path.display().to_string(), e.to_string()))?;
        let set = Self::from_json_str(&json, &path.display().to_string())?;
        tracing::info!(path = %path.display(), rules = set.len(), "Loaded health rule set");
        Ok(set)
    }

    /// The rule set shipped with the application.
    pub fn bundled() -> Result<Self, RuleSetError> {
        Self::from_json_str(BUNDLED_RULES_JSON, "bundled health_rules.json")
    }

    /// Load from `path` if given, otherwise the bundled set.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self, RuleSetError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    /// Three-rule set for tests (no file I/O).
    pub fn load_test() -> Self {
        Self {
            rules: vec![
                HealthRule::new(&["baş ağrısı"], RiskLevel::Low, "Dinlenin ve su içiniz."),
                HealthRule::new(&["ateş", "öksürük"], RiskLevel::Medium, "Bol sıvı tüketin.")
                    .with_disease("Üst solunum yolu enfeksiyonu"),
                HealthRule::new(
                    &["göğüs ağrısı", "nefes darlığı"],
                    RiskLevel::High,
                    "Acil servise başvurun.",
                )
                .with_disease("Kalp veya akciğer kaynaklı acil durum"),
            ],
        }
    }

    pub fn rules(&self) -> &[HealthRule] {
        &self.rules
    }

    /// Phrases that tokenize to nothing at `min_token_chars` and so can
    /// never match, as `(rule_index, phrase)`.
    pub fn unscorable_phrases(&self, min_token_chars: usize) -> Vec<(usize, &str)> {
        self.rules
            .iter()
            .enumerate()
            .flat_map(|(index, rule)| {
                rule.symptom_phrases
                    .iter()
                    .filter(move |phrase| tokenize(phrase, min_token_chars).is_empty())
                    .map(move |phrase| (index, phrase.as_str()))
            })
            .collect()
    }
}

impl Deref for RuleSet {
    type Target = [HealthRule];

    fn deref(&self) -> &Self::Target {
        &self.rules
    }
}

fn validate(rules: &[HealthRule]) -> Result<(), RuleSetError> {
    if rules.is_empty() {
        return Err(RuleSetError::Empty);
    }

    for (index, rule) in rules.iter().enumerate() {
        if rule.symptom_phrases.is_empty() {
            return Err(RuleSetError::InvalidRule {
                index,
                reason: "no symptom phrases".into(),
            });
        }
        if rule.symptom_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(RuleSetError::InvalidRule {
                index,
                reason: "blank symptom phrase".into(),
            });
        }
        if rule.advice.trim().is_empty() {
            return Err(RuleSetError::InvalidRule {
                index,
                reason: "blank advice".into(),
            });
        }
    }

    Ok(())
}
