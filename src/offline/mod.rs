//! Offline health-query matching: fuzzy symptom-rule lookup that works
//! without network access or a hosted model.

pub mod matcher;
pub mod messages;
pub mod note;
pub mod rules;
pub mod sanitize;
pub mod similarity;
pub mod symptom_log;
pub mod types;

pub use matcher::{match_query, match_query_at, OfflineMatcher};
pub use rules::{RuleSet, RuleSetError};
pub use similarity::phrase_similarity;
pub use types::{HealthRule, MatchDetail, MatchResult, OfflineError, PatientContext, RiskLevel};
