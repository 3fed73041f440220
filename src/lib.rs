pub mod config;
pub mod offline; // Offline symptom-rule matcher

use std::io::{BufRead, Write};

use tracing_subscriber::EnvFilter;

use offline::{OfflineError, OfflineMatcher, PatientContext};

/// Env vars carrying the patient descriptor for clinical notes.
pub const PATIENT_NAME_ENV: &str = "SAGLIKASIST_PATIENT_NAME";
pub const PATIENT_AGE_ENV: &str = "SAGLIKASIST_PATIENT_AGE";
pub const PATIENT_GENDER_ENV: &str = "SAGLIKASIST_PATIENT_GENDER";
pub const PATIENT_SCORE_ENV: &str = "SAGLIKASIST_PATIENT_SCORE";

/// Initialize tracing to stderr so stdout stays machine-readable.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Command-line entry: one query per stdin line, one JSON result per stdout line.
pub fn run() -> Result<(), OfflineError> {
    init_tracing();

    tracing::info!("{} offline matcher starting v{}", config::APP_NAME, config::APP_VERSION);

    let matcher = OfflineMatcher::from_env()?;
    let patient = patient_from_lookup(|key| std::env::var(key).ok());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let answered = serve_lines(&matcher, &patient, stdin.lock(), stdout.lock())?;

    tracing::info!(answered, "Input closed, shutting down");
    Ok(())
}

/// Answer every non-blank line of `reader`, writing one JSON `MatchResult`
/// per line to `writer`. Returns the number of queries answered.
pub fn serve_lines<R: BufRead, W: Write>(
    matcher: &OfflineMatcher,
    patient: &PatientContext,
    reader: R,
    mut writer: W,
) -> Result<usize, OfflineError> {
    let mut answered = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = matcher.respond(&line, patient);
        let json = serde_json::to_string(&result)
            .map_err(|e| OfflineError::Serialization(e.to_string()))?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        answered += 1;
    }

    Ok(answered)
}

/// Build the patient descriptor from env-like lookups. Missing keys stay `None`.
pub fn patient_from_lookup<F>(lookup: F) -> PatientContext
where
    F: Fn(&str) -> Option<String>,
{
    PatientContext {
        name: lookup(PATIENT_NAME_ENV),
        age: lookup(PATIENT_AGE_ENV),
        gender: lookup(PATIENT_GENDER_ENV),
        last_score: lookup(PATIENT_SCORE_ENV),
    }
}
