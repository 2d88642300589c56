//! Runtime settings read once from `.env` and the process environment.

use std::path::PathBuf;

/// Default model used for migration recommendations.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default completion budget.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Settings handed to the collaborator boundaries.
///
/// The core never reads the environment; commands load a `Settings` value
/// and pass the pieces each adapter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Credential for the generative model API.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Completion budget.
    pub max_tokens: u32,
    /// When set, port interactions are recorded to this cassette path.
    pub record_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            record_path: None,
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error string if a numeric setting does not parse.
    pub fn load() -> Result<Self, String> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error string if `DOCSHIFT_MAX_TOKENS` is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_tokens = match non_empty("DOCSHIFT_MAX_TOKENS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    format!("DOCSHIFT_MAX_TOKENS must be a positive integer, got `{raw}`")
                })?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            api_key: non_empty("ANTHROPIC_API_KEY"),
            model: non_empty("DOCSHIFT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            record_path: non_empty("DOCSHIFT_RECORD").map(PathBuf::from),
        })
    }
}
