//! Error types shared by the correction pipeline.
//!
//! Per-word failures are local: the engine logs them, flips the status
//! indicator and keeps accepting words. Document mutation has no error type
//! at all, see [`crate::mutator::MutationOutcome`].

use thiserror::Error;

/// Failure of a single correction request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    /// The request exceeded its deadline.
    #[error("correction request timed out")]
    Timeout,

    /// The service answered with a non-success status or a malformed body.
    #[error("correction service error: {0}")]
    Service(String),

    /// The corrector could not be reached at all (worker gone, connection refused).
    #[error("correction service unavailable: {0}")]
    Unavailable(String),
}

impl CorrectionError {
    /// Short message suitable for the status indicator.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout => "Correction timed out",
            Self::Service(_) => "Correction failed",
            Self::Unavailable(_) => "Correction service unavailable",
        }
    }
}

/// Errors raised while loading or saving configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Raw markup that could not be turned back into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unexpected closing tag </{0}>")]
    UnbalancedClose(char),

    #[error("unclosed tag <{0}>")]
    Unclosed(char),

    #[error("stray '{0}' at byte {1}")]
    Stray(char, usize),
}
