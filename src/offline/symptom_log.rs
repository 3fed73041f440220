use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::messages::{risk_label, Language};
use super::types::MatchResult;

/// Symptom-history entry the caller's profile store can persist after an
/// offline match. The matcher itself never stores anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomLog {
    pub id: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// The user's complaint as typed.
    pub symptom: String,
    /// Localized risk label of the matched rule.
    pub severity: Option<String>,
    /// Matched condition category and phrase.
    pub notes: Option<String>,
}

impl SymptomLog {
    /// Build a log entry from a match. `None` for the fallback result or a
    /// blank query.
    pub fn from_match(
        query: &str,
        result: &MatchResult,
        recorded_at: DateTime<Local>,
        lang: Language,
    ) -> Option<Self> {
        let detail = result.matched.as_ref()?;
        let symptom = query.trim();
        if symptom.is_empty() {
            return None;
        }

        let notes = match &result.disease_label {
            Some(disease) => format!("{disease} ({})", detail.matched_phrase),
            None => detail.matched_phrase.clone(),
        };

        Some(Self {
            id: Uuid::new_v4().to_string(),
            timestamp: recorded_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            symptom: symptom.to_string(),
            severity: Some(risk_label(result.risk_level, lang).to_string()),
            notes: Some(notes),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::offline::types::{MatchDetail, RiskLevel};

    fn matched_result() -> MatchResult {
        MatchResult {
            response_text: "Bol sıvı tüketin.".into(),
            risk_level: RiskLevel::Medium,
            disease_label: Some("Enfeksiyon".into()),
            clinical_note: Some("note".into()),
            matched: Some(MatchDetail {
                rule_index: 1,
                matched_phrase: "ateş".into(),
                score: 0.9,
            }),
            is_offline_response: true,
        }
    }

    fn recorded_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 15, 9, 5, 0).single().unwrap()
    }

    #[test]
    fn log_built_from_match() {
        let log = SymptomLog::from_match(" ateşim var ", &matched_result(), recorded_at(), Language::Tr)
            .unwrap();
        assert_eq!(log.symptom, "ateşim var");
        assert_eq!(log.severity.as_deref(), Some("Orta"));
        assert_eq!(log.notes.as_deref(), Some("Enfeksiyon (ateş)"));
        assert!(log.timestamp.starts_with("2026-10-15T09:05:00"));
        assert!(Uuid::parse_str(&log.id).is_ok());
    }

    #[test]
    fn no_log_for_fallback() {
        let fallback = MatchResult::fallback(Language::Tr);
        assert!(SymptomLog::from_match("tırnağım kırıldı", &fallback, recorded_at(), Language::Tr).is_none());
    }

    #[test]
    fn no_log_for_blank_query() {
        assert!(SymptomLog::from_match("  ", &matched_result(), recorded_at(), Language::Tr).is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let log = SymptomLog::from_match("ateş", &matched_result(), recorded_at(), Language::En).unwrap();
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["severity"], "Medium");
        assert!(json.get("timestamp").is_some());
    }
}
