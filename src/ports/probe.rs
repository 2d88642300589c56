//! Connectivity probe port for the target document database.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a connectivity probe failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    /// The server did not answer within the timeout.
    #[error("connection timed out")]
    Timeout,
    /// The server actively refused the connection.
    #[error("connection refused")]
    Refused,
    /// The server rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The connection descriptor is malformed.
    #[error("invalid connection string: {0}")]
    Validation(String),
    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ProbeFailure {
    /// Stable category name stored under `details["error_type"]`.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Refused => "connection_refused",
            Self::Authentication(_) => "authentication",
            Self::Validation(_) => "validation",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

/// Outcome of a connectivity probe. Failures are data, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    /// Whether the target answered.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Extra key/value detail (`error_type`, `connection`, ...).
    pub details: BTreeMap<String, String>,
}

impl ConnectivityResult {
    /// Builds a successful result.
    #[must_use]
    pub fn ok(message: impl Into<String>, details: BTreeMap<String, String>) -> Self {
        Self { success: true, message: message.into(), details }
    }

    /// Builds a failed result tagged with the failure category.
    #[must_use]
    pub fn failed(failure: &ProbeFailure) -> Self {
        let mut details = BTreeMap::new();
        details.insert("error_type".to_string(), failure.category().to_string());
        if let ProbeFailure::Authentication(msg)
        | ProbeFailure::Validation(msg)
        | ProbeFailure::Unexpected(msg) = failure
        {
            details.insert("error_message".to_string(), msg.clone());
        }
        Self { success: false, message: format!("Failed to reach server: {failure}"), details }
    }
}

/// Checks whether a document database answers at a connection descriptor.
pub trait ConnectivityProbe: Send + Sync {
    /// Probes `uri`, giving up after `timeout`.
    fn probe(&self, uri: &str, timeout: Duration) -> ConnectivityResult;
}
