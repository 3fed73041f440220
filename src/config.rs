use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::offline::messages::Language;

/// Application-level constants
pub const APP_NAME: &str = "SağlıkAsist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Env var pointing at a rule-set JSON file (overrides every other source).
pub const RULES_PATH_ENV: &str = "SAGLIKASIST_RULES";
/// Env var overriding the acceptance threshold.
pub const THRESHOLD_ENV: &str = "SAGLIKASIST_MATCH_THRESHOLD";
/// Env var selecting the response language ("tr" or "en").
pub const LANG_ENV: &str = "SAGLIKASIST_LANG";

/// Rule-set file name inside the app data directory.
pub const RULES_FILE_NAME: &str = "health_rules.json";

/// Default acceptance threshold. A best score must be strictly above it.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.45;
/// Pairwise score when one token contains the other.
pub const DEFAULT_CONTAINMENT_SCORE: f64 = 0.9;
/// Tokens shorter than this (in chars) are discarded.
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 3;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "saglikasist=debug,saglikasist_lib=debug"
    } else {
        "saglikasist=info,saglikasist_lib=info"
    }
}

/// True for debug builds.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Get the application data directory
/// ~/SaglikAsist/ on all platforms. `None` when the home directory is unknown.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("SaglikAsist"))
}

/// Resolve where the rule set should be read from.
///
/// Priority:
/// 1. `SAGLIKASIST_RULES` env var (explicit override)
/// 2. `~/SaglikAsist/health_rules.json` if the file exists
/// 3. `None`: use the bundled rule set
pub fn rules_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(RULES_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    app_data_dir()
        .map(|dir| dir.join(RULES_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Tunables for the offline matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Best score must be strictly greater than this to accept a rule.
    pub threshold: f64,
    /// Pairwise token score for substring containment.
    pub containment_score: f64,
    /// Minimum token length in chars; shorter tokens are dropped.
    pub min_token_chars: usize,
    /// Optional cap on query length in chars, applied before scoring.
    /// `None` scores the whole query.
    pub max_query_chars: Option<usize>,
    /// Language for fallback text and clinical-note headings.
    pub language: Language,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            containment_score: DEFAULT_CONTAINMENT_SCORE,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
            max_query_chars: None,
            language: Language::default(),
        }
    }
}

impl MatcherConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides taken from `lookup` (env-like key → value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(THRESHOLD_ENV) {
            config.threshold = raw.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                key: THRESHOLD_ENV,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(LANG_ENV) {
            config.language = Language::from_code(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every query match or none.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ConfigError::OutOfRange {
                field: "threshold",
                value: self.threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.containment_score) {
            return Err(ConfigError::OutOfRange {
                field: "containment_score",
                value: self.containment_score,
            });
        }
        if self.min_token_chars == 0 {
            return Err(ConfigError::OutOfRange {
                field: "min_token_chars",
                value: 0.0,
            });
        }
        if self.max_query_chars == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "max_query_chars",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
