//! Phrase similarity for offline symptom matching.
//!
//! Token-level comparison: every phrase token is scored against its best
//! query token, and the phrase score is the mean over phrase tokens. A query
//! with extra words is not penalized; a phrase with words the query lacks is.
//!
//! Lower-casing is `str::to_lowercase` with no locale tailoring. For Turkish
//! this means `I` folds to `i` (not `ı`) and `İ` folds to `i` + U+0307, so
//! upper-case input scores slightly below its lower-case equivalent.

use strsim::levenshtein;

use crate::config::{MatcherConfig, DEFAULT_CONTAINMENT_SCORE, DEFAULT_MIN_TOKEN_CHARS};

/// Scoring tunables, split out of `MatcherConfig` so the scorer stays a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub containment_score: f64,
    pub min_token_chars: usize,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            containment_score: DEFAULT_CONTAINMENT_SCORE,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }
}

impl From<&MatcherConfig> for ScoringParams {
    fn from(config: &MatcherConfig) -> Self {
        Self {
            containment_score: config.containment_score,
            min_token_chars: config.min_token_chars,
        }
    }
}

/// Split on whitespace, trim edge punctuation, lower-case, and drop tokens
/// shorter than `min_chars` characters.
pub fn tokenize(text: &str, min_chars: usize) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|token| token.chars().count() >= min_chars)
        .collect()
}

/// Similarity of `phrase` to `query` in [0, 1] with default parameters.
pub fn phrase_similarity(query: &str, phrase: &str) -> f64 {
    phrase_similarity_with(query, phrase, &ScoringParams::default())
}

/// Similarity of `phrase` to `query` in [0, 1].
pub fn phrase_similarity_with(query: &str, phrase: &str, params: &ScoringParams) -> f64 {
    let query_tokens = tokenize(query, params.min_token_chars);
    score_against_tokens(&query_tokens, phrase, params)
}

/// Score a phrase against an already tokenized query.
/// The matcher tokenizes the query once and calls this per phrase.
pub fn score_against_tokens(query_tokens: &[String], phrase: &str, params: &ScoringParams) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let phrase_tokens = tokenize(phrase, params.min_token_chars);
    if phrase_tokens.is_empty() {
        return 0.0;
    }

    let total: f64 = phrase_tokens
        .iter()
        .map(|p| {
            query_tokens
                .iter()
                .map(|q| token_score(p, q, params.containment_score))
                .fold(0.0, f64::max)
        })
        .sum();

    total / phrase_tokens.len() as f64
}

/// Pairwise token score: 1.0 on equality, `containment` when one token
/// contains the other, otherwise normalized Levenshtein similarity.
pub fn token_score(p: &str, q: &str, containment: f64) -> f64 {
    if p == q {
        return 1.0;
    }
    if q.contains(p) || p.contains(q) {
        return containment;
    }

    let longest = p.chars().count().max(q.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let distance = levenshtein(p, q);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}
