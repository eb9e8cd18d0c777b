//! Process-wide settings, resolved once at start-up and read-only afterwards.
//!
//! Values come from the process environment (optionally seeded from a local
//! `.env` file). Tests and embedders can build the same value from any key
//! lookup through [`Settings::from_lookup`], so nothing here depends on
//! ambient global state once constructed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::agents::retrieval::DEFAULT_TRIGGER_TERMS;
use crate::errors::CourseRagError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_CHROMA_PATH: &str = "./chroma_db";

const DEFAULT_CHUNK_SIZE: usize = 800;
const DEFAULT_CHUNK_OVERLAP: usize = 100;
const DEFAULT_MAX_RESULTS: usize = 15;
const DEFAULT_MAX_HISTORY: usize = 2;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
const DEFAULT_TOOL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 45_000;

/// Immutable configuration shared by the orchestrator and the retrieval
/// subsystem. Only accessors are exposed.
#[derive(Clone)]
pub struct Settings {
    api_key: String,
    model: String,
    base_url: String,
    embedding_model: String,
    chunk_size: usize,
    chunk_overlap: usize,
    max_results: usize,
    max_history: usize,
    chroma_path: PathBuf,
    max_output_tokens: u32,
    tool_timeout: Duration,
    generation_timeout: Duration,
    trigger_terms: Vec<String>,
}

impl Settings {
    /// Read `.env` (if any) and the process environment.
    pub fn load() -> Result<Self, CourseRagError> {
        // A missing .env file is the normal case in deployed environments.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup. Blank values count as
    /// absent and fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CourseRagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(API_KEY_VAR).ok_or(CourseRagError::MissingCredential)?;

        let chunk_size = parse_setting("CHUNK_SIZE", read("CHUNK_SIZE"), DEFAULT_CHUNK_SIZE, 1)?;
        let chunk_overlap = parse_setting(
            "CHUNK_OVERLAP",
            read("CHUNK_OVERLAP"),
            DEFAULT_CHUNK_OVERLAP,
            0,
        )?;
        if chunk_overlap >= chunk_size {
            return Err(CourseRagError::InvalidSetting {
                key: "CHUNK_OVERLAP",
                value: chunk_overlap.to_string(),
            });
        }

        let trigger_terms = match read("RETRIEVAL_TRIGGER_TERMS") {
            Some(raw) => {
                let terms: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(str::to_string)
                    .collect();
                if terms.is_empty() {
                    return Err(CourseRagError::InvalidSetting {
                        key: "RETRIEVAL_TRIGGER_TERMS",
                        value: raw,
                    });
                }
                terms
            }
            None => DEFAULT_TRIGGER_TERMS.iter().map(|t| t.to_string()).collect(),
        };

        Ok(Self {
            api_key,
            model: read("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: read("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            embedding_model: read("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            chunk_size,
            chunk_overlap,
            max_results: parse_setting("MAX_RESULTS", read("MAX_RESULTS"), DEFAULT_MAX_RESULTS, 1)?,
            max_history: parse_setting("MAX_HISTORY", read("MAX_HISTORY"), DEFAULT_MAX_HISTORY, 0)?,
            chroma_path: read("CHROMA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHROMA_PATH)),
            max_output_tokens: parse_setting(
                "MAX_OUTPUT_TOKENS",
                read("MAX_OUTPUT_TOKENS"),
                DEFAULT_MAX_OUTPUT_TOKENS,
                1,
            )?,
            tool_timeout: Duration::from_millis(parse_setting(
                "TOOL_TIMEOUT_MS",
                read("TOOL_TIMEOUT_MS"),
                DEFAULT_TOOL_TIMEOUT_MS,
                1,
            )?),
            generation_timeout: Duration::from_millis(parse_setting(
                "GENERATION_TIMEOUT_MS",
                read("GENERATION_TIMEOUT_MS"),
                DEFAULT_GENERATION_TIMEOUT_MS,
                1,
            )?),
            trigger_terms,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Number of prior conversation messages callers should flatten into history.
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn chroma_path(&self) -> &Path {
        &self.chroma_path
    }

    /// Upper bound on generated tokens per answer.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }

    /// Vocabulary consulted by the keyword retrieval policy.
    pub fn trigger_terms(&self) -> &[String] {
        &self.trigger_terms
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("max_results", &self.max_results)
            .field("max_history", &self.max_history)
            .field("chroma_path", &self.chroma_path)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("tool_timeout", &self.tool_timeout)
            .field("generation_timeout", &self.generation_timeout)
            .field("trigger_terms", &self.trigger_terms)
            .finish()
    }
}

fn parse_setting<T>(
    key: &'static str,
    raw: Option<String>,
    default: T,
    min: T,
) -> Result<T, CourseRagError>
where
    T: FromStr + PartialOrd,
{
    match raw {
        None => Ok(default),
        Some(value) => match value.parse::<T>() {
            Ok(parsed) if parsed >= min => Ok(parsed),
            _ => Err(CourseRagError::InvalidSetting { key, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, CourseRagError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn missing_credential_fails_fast() {
        assert!(matches!(
            settings_from(&[]),
            Err(CourseRagError::MissingCredential)
        ));
        assert!(matches!(
            settings_from(&[(API_KEY_VAR, "   ")]),
            Err(CourseRagError::MissingCredential)
        ));
    }

    #[test]
    fn defaults_match_reference_configuration() {
        let settings = settings_from(&[(API_KEY_VAR, "secret")]).unwrap();
        assert_eq!(settings.api_key(), "secret");
        assert_eq!(settings.model(), DEFAULT_MODEL);
        assert_eq!(settings.embedding_model(), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.chunk_size(), 800);
        assert_eq!(settings.chunk_overlap(), 100);
        assert_eq!(settings.max_results(), 15);
        assert_eq!(settings.max_history(), 2);
        assert_eq!(settings.chroma_path(), Path::new("./chroma_db"));
        assert_eq!(settings.max_output_tokens(), 800);
        assert_eq!(settings.tool_timeout(), Duration::from_secs(10));
        assert_eq!(settings.trigger_terms().len(), DEFAULT_TRIGGER_TERMS.len());
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(&[
            (API_KEY_VAR, "secret"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("MAX_OUTPUT_TOKENS", "256"),
            ("MAX_HISTORY", "0"),
            ("RETRIEVAL_TRIGGER_TERMS", "syllabus, , quiz"),
        ])
        .unwrap();
        assert_eq!(settings.model(), "gemini-1.5-pro");
        assert_eq!(settings.max_output_tokens(), 256);
        assert_eq!(settings.max_history(), 0);
        assert_eq!(settings.trigger_terms(), ["syllabus", "quiz"]);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = settings_from(&[(API_KEY_VAR, "k"), ("MAX_RESULTS", "lots")]).unwrap_err();
        assert!(matches!(
            err,
            CourseRagError::InvalidSetting { key: "MAX_RESULTS", .. }
        ));

        let err = settings_from(&[(API_KEY_VAR, "k"), ("TOOL_TIMEOUT_MS", "0")]).unwrap_err();
        assert_eq!(err.code(), "CFG-1002");
    }

    #[test]
    fn trigger_terms_without_any_term_are_rejected() {
        for raw in [",", " , ,"] {
            let err = settings_from(&[(API_KEY_VAR, "k"), ("RETRIEVAL_TRIGGER_TERMS", raw)])
                .unwrap_err();
            assert!(matches!(
                err,
                CourseRagError::InvalidSetting { key: "RETRIEVAL_TRIGGER_TERMS", .. }
            ));
        }
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let err = settings_from(&[
            (API_KEY_VAR, "k"),
            ("CHUNK_SIZE", "100"),
            ("CHUNK_OVERLAP", "100"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CourseRagError::InvalidSetting { key: "CHUNK_OVERLAP", .. }
        ));
    }

    #[test]
    fn debug_output_hides_credential() {
        let settings = settings_from(&[(API_KEY_VAR, "super-secret")]).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
