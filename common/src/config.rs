//! Assessment engine configuration.
//!
//! `AssessmentConfig` is loaded once from `.env` and the process environment into a
//! process-wide cell. Engines take a copy of the values at construction time, so tests
//! can build them from [`AssessmentConfig::default`] without touching the environment.

use once_cell::sync::OnceCell;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    pub log_level: String,
    pub log_file: String,
    /// Open locks an assessor may hold across every exercise at once.
    pub max_locks_per_assessor: usize,
    /// Share of samples that must agree on a credit value before it is suggested.
    pub min_agreement_ratio: f64,
    /// Absolute number of agreeing samples required before a credit value is suggested.
    pub min_agreeing_count: usize,
    /// Minimum element similarity for two elements to share a similarity set.
    pub similarity_threshold: f64,
    pub max_feedback_text_length: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_file: "logs/assessment.log".into(),
            max_locks_per_assessor: 10,
            min_agreement_ratio: 0.8,
            min_agreeing_count: 1,
            similarity_threshold: 0.8,
            max_feedback_text_length: 5000,
        }
    }
}

static CONFIG: OnceCell<AssessmentConfig> = OnceCell::new();

impl AssessmentConfig {
    /// Builds a config from environment variables, falling back to the defaults
    /// for anything missing or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_file: env::var("LOG_FILE").unwrap_or(defaults.log_file),
            max_locks_per_assessor: parse_or(
                "MAX_LOCKS_PER_ASSESSOR",
                defaults.max_locks_per_assessor,
            ),
            min_agreement_ratio: parse_or("CONFIDENCE_MIN_AGREEMENT", defaults.min_agreement_ratio),
            min_agreeing_count: parse_or("CONFIDENCE_MIN_AGREEING", defaults.min_agreeing_count),
            similarity_threshold: parse_or("SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            max_feedback_text_length: parse_or(
                "MAX_FEEDBACK_TEXT_LENGTH",
                defaults.max_feedback_text_length,
            ),
        }
    }

    /// Returns the global config, initializing it from the environment on first use.
    pub fn global() -> &'static Self {
        CONFIG.get_or_init(|| {
            dotenvy::dotenv().ok();
            Self::from_env()
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid value '{raw}' for {key}, using {default:?}");
            default
        }),
        Err(_) => default,
    }
}
