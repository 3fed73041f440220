//! Clinical note synthesis for medium/high-risk offline matches.
//!
//! The note is a fixed-format text block the caller can surface as
//! "note to share with a doctor". It embeds the query as typed, with line
//! breaks, control and invisible characters escaped so the query always
//! stays on its own line.

use chrono::NaiveDateTime;

use super::messages::{note_labels, risk_label, Language};
use super::sanitize::is_invisible;
use super::types::{MatchDetail, PatientContext, RiskLevel};

/// Timestamp format used in the note header.
pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Everything the note needs about the match.
pub struct NoteInput<'a> {
    pub query: &'a str,
    pub patient: &'a PatientContext,
    pub detail: &'a MatchDetail,
    pub risk_level: RiskLevel,
    pub disease_label: Option<&'a str>,
    pub generated_at: NaiveDateTime,
    pub language: Language,
}

/// Render the clinical note block.
pub fn compose_clinical_note(input: &NoteInput<'_>) -> String {
    let labels = note_labels(input.language);
    let last_score = input
        .patient
        .last_score
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("-");

    let mut lines = vec![
        labels.title.to_string(),
        format!(
            "{}: {}",
            labels.date,
            input.generated_at.format(NOTE_TIMESTAMP_FORMAT)
        ),
        format!("{}: {}", labels.patient, input.patient.descriptor()),
        format!("{}: {}", labels.last_score, last_score),
        format!("{}: \"{}\"", labels.complaint, escape_query(input.query)),
        format!("{}: {}", labels.matched, input.detail.matched_phrase),
        format!(
            "{}: {}",
            labels.similarity,
            format_percent(input.detail.score, input.language)
        ),
        format!(
            "{}: {}",
            labels.risk,
            risk_label(input.risk_level, input.language)
        ),
    ];

    if let Some(disease) = input.disease_label {
        lines.push(format!("{}: {}", labels.disease, disease));
    }

    lines.push("-".repeat(labels.title.chars().count()));
    lines.join("\n")
}

/// Escape everything that could break or disguise the note layout.
/// Printable text, spaces included, passes through unchanged.
fn escape_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || is_invisible(c) || matches!(c, '\u{2028}' | '\u{2029}') => {
                out.extend(c.escape_unicode())
            }
            c => out.push(c),
        }
    }
    out
}

/// Turkish puts the percent sign first ("%64"); English after ("64%").
fn format_percent(score: f64, lang: Language) -> String {
    let pct = (score * 100.0).round();
    match lang {
        Language::Tr => format!("%{pct:.0}"),
        Language::En => format!("{pct:.0}%"),
    }
}
