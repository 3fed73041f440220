use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Result of query sanitization (pre-scoring).
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedQuery {
    /// The cleaned query text.
    pub text: String,
    /// Whether any modifications were made.
    pub was_modified: bool,
    /// What was stripped (for audit, no patient data).
    pub modifications: Vec<QueryModification>,
}

/// A modification made during sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryModification {
    pub kind: QueryModificationKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryModificationKind {
    InvisibleUnicodeRemoved,
    ControlCharacterRemoved,
    ExcessiveLengthTruncated,
}

/// Clean a user query before tokenization.
///
/// Strips invisible Unicode and control characters, collapses whitespace
/// runs to single spaces. With `max_chars` set, truncates to that many
/// characters at a word boundary.
pub fn sanitize_query(raw_query: &str, max_chars: Option<usize>) -> SanitizedQuery {
    let mut modifications = Vec::new();

    let text = remove_invisible_unicode(raw_query);
    if text.chars().count() != raw_query.chars().count() {
        modifications.push(QueryModification {
            kind: QueryModificationKind::InvisibleUnicodeRemoved,
            description: "Stripped non-visible Unicode characters".to_string(),
        });
    }

    let before = text.chars().count();
    let text = remove_control_characters(&text);
    if text.chars().count() != before {
        modifications.push(QueryModification {
            kind: QueryModificationKind::ControlCharacterRemoved,
            description: "Stripped control characters".to_string(),
        });
    }

    let mut text = WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned();

    let char_count = text.chars().count();
    if let Some(max_chars) = max_chars.filter(|max| char_count > *max) {
        text = truncate_at_word_boundary(&text, max_chars);
        modifications.push(QueryModification {
            kind: QueryModificationKind::ExcessiveLengthTruncated,
            description: format!(
                "Truncated from {} to {} characters",
                char_count,
                text.chars().count()
            ),
        });
    }

    SanitizedQuery {
        text,
        was_modified: !modifications.is_empty(),
        modifications,
    }
}

/// Zero-width, directional and other non-visible Unicode characters.
pub(crate) fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'  // Zero-width chars
        | '\u{202A}'..='\u{202E}' // Directional formatting
        | '\u{2060}'..='\u{2064}' // Invisible operators
        | '\u{2066}'..='\u{2069}' // Directional isolates
        | '\u{FEFF}'              // BOM
        | '\u{00AD}'              // Soft hyphen
        | '\u{034F}'              // Combining grapheme joiner
    )
}

/// Remove zero-width and invisible Unicode characters.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Remove control characters. Whitespace controls (newline, tab) are kept
/// and later collapsed to spaces.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// Keep at most `max_chars` characters, cutting back to the last space.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated,
    }
}
