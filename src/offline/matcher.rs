use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::config::{self, MatcherConfig};

use super::note::{compose_clinical_note, NoteInput};
use super::rules::RuleSet;
use super::sanitize::sanitize_query;
use super::similarity::{score_against_tokens, tokenize, ScoringParams};
use super::types::{HealthRule, MatchDetail, MatchResult, OfflineError, PatientContext};

/// Match a query against `rules` with default tunables and the current time.
pub fn match_query(query: &str, rules: &[HealthRule], patient: &PatientContext) -> MatchResult {
    match_query_at(
        query,
        rules,
        patient,
        Local::now().naive_local(),
        &MatcherConfig::default(),
    )
}

/// Match a query against `rules`.
///
/// Pure apart from `now`, which is only used for the clinical-note timestamp.
/// Rules are scanned in order and a later rule replaces the best only on a
/// strictly greater score, so ties go to the earliest rule. A best score at
/// or below `config.threshold` yields the fallback result.
pub fn match_query_at(
    query: &str,
    rules: &[HealthRule],
    patient: &PatientContext,
    now: NaiveDateTime,
    config: &MatcherConfig,
) -> MatchResult {
    let start = Instant::now();

    let sanitized = sanitize_query(query, config.max_query_chars);
    if sanitized.was_modified {
        tracing::debug!(
            modifications = sanitized.modifications.len(),
            "Offline query sanitized"
        );
    }

    let params = ScoringParams::from(config);
    let query_tokens = tokenize(&sanitized.text, params.min_token_chars);
    if query_tokens.is_empty() {
        tracing::debug!("Offline query has no scorable tokens, using fallback");
        return MatchResult::fallback(config.language);
    }

    let mut best_score = 0.0;
    let mut best: Option<(usize, &HealthRule, &str)> = None;

    for (index, rule) in rules.iter().enumerate() {
        for phrase in &rule.symptom_phrases {
            let score = score_against_tokens(&query_tokens, phrase, &params);
            if score > best_score {
                best_score = score;
                best = Some((index, rule, phrase.as_str()));
            }
        }
    }

    let Some((rule_index, rule, phrase)) = best.filter(|_| best_score > config.threshold) else {
        tracing::info!(
            best_score,
            threshold = config.threshold,
            rules = rules.len(),
            "No offline rule cleared the threshold"
        );
        return MatchResult::fallback(config.language);
    };

    let detail = MatchDetail {
        rule_index,
        matched_phrase: phrase.to_string(),
        score: best_score,
    };

    let clinical_note = rule.risk_level.needs_clinical_note().then(|| {
        compose_clinical_note(&NoteInput {
            query,
            patient,
            detail: &detail,
            risk_level: rule.risk_level,
            disease_label: rule.disease_label.as_deref(),
            generated_at: now,
            language: config.language,
        })
    });

    tracing::debug!(
        rule_index,
        score = best_score,
        risk = rule.risk_level.as_str(),
        with_note = clinical_note.is_some(),
        processing_us = start.elapsed().as_micros() as u64,
        "Offline rule matched"
    );

    MatchResult {
        response_text: rule.advice.clone(),
        risk_level: rule.risk_level,
        disease_label: rule.disease_label.clone(),
        clinical_note,
        matched: Some(detail),
        is_offline_response: true,
    }
}

/// The offline chat feature: a loaded rule set plus its tunables.
///
/// Cheap to clone; the rule set is shared.
#[derive(Debug, Clone)]
pub struct OfflineMatcher {
    rules: Arc<RuleSet>,
    config: MatcherConfig,
}

impl OfflineMatcher {
    pub fn new(rules: RuleSet, config: MatcherConfig) -> Result<Self, OfflineError> {
        config.validate()?;
        for (rule_index, phrase) in rules.unscorable_phrases(config.min_token_chars) {
            tracing::warn!(
                rule_index,
                phrase = %phrase,
                min_token_chars = config.min_token_chars,
                "Symptom phrase has no scorable tokens and can never match"
            );
        }
        Ok(Self {
            rules: Arc::new(rules),
            config,
        })
    }

    /// Config from the environment; rules from `SAGLIKASIST_RULES`, the
    /// app data directory, or the bundled set.
    pub fn from_env() -> Result<Self, OfflineError> {
        let config = MatcherConfig::from_env()?;
        let rules = RuleSet::load_or_bundled(config::rules_path().as_deref())?;
        tracing::info!(
            rules = rules.len(),
            threshold = config.threshold,
            language = config.language.as_str(),
            "Offline matcher ready"
        );
        Self::new(rules, config)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Answer a query using the current local time for any clinical note.
    pub fn respond(&self, query: &str, patient: &PatientContext) -> MatchResult {
        self.respond_at(query, patient, Local::now().naive_local())
    }

    pub fn respond_at(
        &self,
        query: &str,
        patient: &PatientContext,
        now: NaiveDateTime,
    ) -> MatchResult {
        match_query_at(query, &self.rules, patient, now, &self.config)
    }

    /// Run the match on tokio's blocking pool, for callers on an async
    /// runtime with large rule sets.
    pub async fn respond_async(
        &self,
        query: String,
        patient: PatientContext,
    ) -> Result<MatchResult, OfflineError> {
        let matcher = self.clone();
        tokio::task::spawn_blocking(move || matcher.respond(&query, &patient))
            .await
            .map_err(|e| OfflineError::TaskJoin(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::offline::messages::{fallback_message, Language, FALLBACK_MESSAGE};
    use crate::offline::similarity::phrase_similarity;
    use crate::offline::types::RiskLevel;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn run(query: &str, rules: &[HealthRule]) -> MatchResult {
        match_query_at(
            query,
            rules,
            &PatientContext::default(),
            fixed_time(),
            &MatcherConfig::default(),
        )
    }

    fn assert_fallback(result: &MatchResult) {
        assert!(result.is_fallback(), "expected fallback, got {result:?}");
        assert_eq!(result.response_text, FALLBACK_MESSAGE);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.disease_label.is_none());
        assert!(result.clinical_note.is_none());
    }

    // ── End-to-end scenarios ────────────────────────────────

    #[test]
    fn headache_matches_low_risk_rule_without_note() {
        let rules = RuleSet::load_test();
        let result = run("başım çok ağrıyor", &rules);
        assert_eq!(result.matched.as_ref().map(|m| m.rule_index), Some(0));
        assert_eq!(result.response_text, "Dinlenin ve su içiniz.");
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.clinical_note.is_none());
    }

    #[test]
    fn fever_and_cough_match_medium_rule_with_note() {
        let rules = RuleSet::load_test();
        let result = run("ateşim var ve öksürüyorum", &rules);
        let detail = result.matched.as_ref().unwrap();
        assert_eq!(detail.rule_index, 1);
        assert_eq!(detail.matched_phrase, "ateş");
        assert_eq!(result.response_text, "Bol sıvı tüketin.");
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.disease_label.as_deref(), Some("Üst solunum yolu enfeksiyonu"));
        let note = result.clinical_note.as_deref().unwrap();
        assert!(note.contains("ateşim var ve öksürüyorum"));
        assert!(note.contains("2026-10-15 09:05"));
        assert!(note.contains("Benzerlik: %90"));
    }

    #[test]
    fn chest_pain_matches_high_rule_with_note() {
        let rules = RuleSet::load_test();
        let result = run("göğsümde ağrı ve nefes alamıyorum", &rules);
        assert_eq!(result.matched.as_ref().map(|m| m.rule_index), Some(2));
        assert_eq!(result.response_text, "Acil servise başvurun.");
        assert_eq!(result.risk_level, RiskLevel::High);
        let note = result.clinical_note.as_deref().unwrap();
        assert!(note.contains("göğsümde ağrı ve nefes alamıyorum"));
        assert!(note.contains("Risk: Yüksek"));
    }

    #[test]
    fn unrelated_query_falls_back() {
        let rules = RuleSet::load_test();
        assert_fallback(&run("tırnağım kırıldı", &rules));
    }

    // ── Degenerate input ────────────────────────────────────

    #[test]
    fn empty_and_blank_queries_fall_back() {
        let rules = RuleSet::load_test();
        for query in ["", "   ", "\n\t", "ve de", "\u{200B}"] {
            assert_fallback(&run(query, &rules));
        }
    }

    #[test]
    fn empty_rule_slice_falls_back() {
        assert_fallback(&run("baş ağrısı", &[]));
    }

    // ── Threshold boundary ──────────────────────────────────

    #[test]
    fn score_exactly_at_threshold_does_not_match() {
        // "headache" is contained in "headaches" (0.9); the z-token shares
        // no characters with it (0.0). Mean is exactly 0.45.
        let rules = vec![HealthRule::new(&["headache zzzzzzzzz"], RiskLevel::Medium, "Rest.")];
        assert_eq!(phrase_similarity("headaches", "headache zzzzzzzzz"), 0.45);
        assert_fallback(&run("headaches", &rules));
    }

    #[test]
    fn score_just_above_threshold_matches() {
        let rules = vec![HealthRule::new(&["headache zzzzzzzzs"], RiskLevel::Medium, "Rest.")];
        let score = phrase_similarity("headaches", "headache zzzzzzzzs");
        assert!(score > 0.45 && score < 0.51, "got {score}");
        let result = run("headaches", &rules);
        assert_eq!(result.response_text, "Rest.");
    }

    #[test]
    fn lowered_threshold_accepts_boundary_score() {
        let rules = vec![HealthRule::new(&["headache zzzzzzzzz"], RiskLevel::Low, "Rest.")];
        let config = MatcherConfig {
            threshold: 0.44,
            ..MatcherConfig::default()
        };
        let result = match_query_at(
            "headaches",
            &rules,
            &PatientContext::default(),
            fixed_time(),
            &config,
        );
        assert!(!result.is_fallback());
    }

    // ── Ordering ────────────────────────────────────────────

    #[test]
    fn ties_go_to_earlier_rule() {
        let first = HealthRule::new(&["ateş"], RiskLevel::Low, "first");
        let second = HealthRule::new(&["ateş"], RiskLevel::High, "second");

        let result = run("ateşim var", &[first.clone(), second.clone()]);
        assert_eq!(result.response_text, "first");
        assert_eq!(result.matched.as_ref().map(|m| m.rule_index), Some(0));

        let result = run("ateşim var", &[second, first]);
        assert_eq!(result.response_text, "second");
    }

    #[test]
    fn ties_within_a_rule_keep_first_phrase() {
        // Both phrases lower-case to the query and score 1.0.
        let rule = HealthRule::new(&["Ateş", "ATEŞ"], RiskLevel::Medium, "x");
        let result = run("ateş", &[rule]);
        assert_eq!(result.matched.unwrap().matched_phrase, "Ateş");
    }

    // ── Invariants ──────────────────────────────────────────

    #[test]
    fn matching_is_deterministic() {
        let rules = RuleSet::load_test();
        for query in ["ateşim var ve öksürüyorum", "tırnağım kırıldı", "göğüs ağrısı"] {
            assert_eq!(run(query, &rules), run(query, &rules));
        }
    }

    #[test]
    fn clinical_note_only_for_medium_and_high_matches() {
        let rules = RuleSet::bundled().unwrap();
        let queries = [
            "başım çok ağrıyor",
            "ateşim var ve titriyorum",
            "göğsümde baskı var",
            "nefes alamıyorum",
            "burnum akıyor ve hapşırıyorum",
            "tırnağım kırıldı",
            "",
            "midem bulanıyor ve kusma var",
        ];
        for query in queries {
            let result = run(query, &rules);
            match result.risk_level {
                RiskLevel::Low => assert!(result.clinical_note.is_none(), "{query}"),
                RiskLevel::Medium | RiskLevel::High => {
                    assert!(!result.is_fallback());
                    let note = result.clinical_note.as_deref().unwrap();
                    assert!(note.contains(query), "{query}");
                }
            }
        }
    }

    #[test]
    fn note_embeds_query_as_given() {
        let rules = RuleSet::load_test();
        let query = "  ateşim var ve öksürüyorum  ";
        let result = run(query, &rules);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.clinical_note.unwrap().contains(query));
    }

    #[test]
    fn multiline_query_keeps_single_risk_line() {
        let rules = RuleSet::load_test();
        let result = run("ateşim var\nRisk: Düşük\n\u{202E}ksür", &rules);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        let note = result.clinical_note.unwrap();
        let risk_lines: Vec<&str> = note.lines().filter(|l| l.starts_with("Risk:")).collect();
        assert_eq!(risk_lines, vec!["Risk: Orta"]);
        assert!(note.contains("ateşim var\\nRisk: Düşük\\n\\u{202e}ksür"));
    }

    #[test]
    fn symptom_words_after_long_padding_still_match() {
        let rules = RuleSet::load_test();
        let query = format!("{} ateşim var", "xxxxxxxxxx ".repeat(200));
        let result = run(&query, &rules);
        let detail = result.matched.as_ref().unwrap();
        assert_eq!(detail.rule_index, 1);
        assert_eq!(detail.score, 0.9);
    }

    #[test]
    fn query_cap_applies_only_when_configured() {
        let rules = RuleSet::load_test();
        let query = format!("{} ateşim var", "xxxxxxxxxx ".repeat(200));
        let config = MatcherConfig {
            max_query_chars: Some(100),
            ..MatcherConfig::default()
        };
        let result = match_query_at(
            &query,
            &rules,
            &PatientContext::default(),
            fixed_time(),
            &config,
        );
        assert_fallback(&result);
    }

    #[test]
    fn note_embeds_patient_context() {
        let rules = RuleSet::load_test();
        let patient = PatientContext {
            name: Some("Mehmet Kaya".into()),
            age: Some("52".into()),
            gender: Some("male".into()),
            last_score: Some("48".into()),
        };
        let result = match_query_at(
            "göğüs ağrısı",
            &rules,
            &patient,
            fixed_time(),
            &MatcherConfig::default(),
        );
        let note = result.clinical_note.unwrap();
        assert!(note.contains("Hasta: Mehmet Kaya, 52, male"));
        assert!(note.contains("Son skor: 48"));
        assert!(note.contains("Benzerlik: %100"));
    }

    #[test]
    fn english_config_localizes_fallback() {
        let config = MatcherConfig {
            language: Language::En,
            ..MatcherConfig::default()
        };
        let result = match_query_at(
            "",
            &RuleSet::load_test(),
            &PatientContext::default(),
            fixed_time(),
            &config,
        );
        assert_eq!(result.response_text, fallback_message(Language::En));
    }

    // ── OfflineMatcher ──────────────────────────────────────

    #[test]
    fn matcher_rejects_invalid_config() {
        let config = MatcherConfig {
            threshold: 1.5,
            ..MatcherConfig::default()
        };
        let err = OfflineMatcher::new(RuleSet::load_test(), config).unwrap_err();
        assert!(matches!(err, OfflineError::Config(_)));
    }

    #[test]
    fn matcher_respond_at_matches_free_function() {
        let matcher = OfflineMatcher::new(RuleSet::load_test(), MatcherConfig::default()).unwrap();
        let patient = PatientContext::default();
        assert_eq!(
            matcher.respond_at("ateşim var", &patient, fixed_time()),
            run("ateşim var", &RuleSet::load_test())
        );
    }

    #[tokio::test]
    async fn respond_async_runs_on_blocking_pool() {
        let matcher = OfflineMatcher::new(RuleSet::load_test(), MatcherConfig::default()).unwrap();
        let result = matcher
            .respond_async("başım çok ağrıyor".into(), PatientContext::default())
            .await
            .unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.response_text, "Dinlenin ve su içiniz.");
    }

    #[test]
    fn matcher_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OfflineMatcher>();

        let matcher = OfflineMatcher::new(RuleSet::load_test(), MatcherConfig::default()).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = matcher.clone();
                std::thread::spawn(move || {
                    m.respond_at("ateşim var", &PatientContext::default(), fixed_time())
                })
            })
            .collect();
        let results: Vec<MatchResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
