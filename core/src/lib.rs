//! libtypo-core
//!
//! Network-free core of the assisted correction editor: the styled document
//! model, caret mapping, word boundary detection, single-flight correction
//! orchestration, caret-preserving mutation and the suggestion overlay.
//!
//! Backends plug in through the [`Corrector`] trait (see the `libollama`
//! crate for the Ollama implementation).
//!
//! Public API:
//! - `Document` / `Fragment` - Styled text and the offset <-> caret mapping
//! - `EditorState` - Document, selection and typing style
//! - `WordBoundaryDetector` - Emits completed words as the user types
//! - `CorrectionOrchestrator` - One request in flight, stale results dropped
//! - `CaretPreservingMutator` - Splices corrections back into the document
//! - `SuggestionPresenter` - Suggestion overlay state
//! - `CorrectionEngine` - Key-event driven coordinator
//! - `Config` - Configuration and feature flags
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{ConfigError, CorrectionError, MarkupError};

pub mod document;
pub use document::{CaretPosition, Document, Fragment, Style, StyleFlag};

pub mod state;
pub use state::{EditorState, Selection};

pub mod boundary;
pub use boundary::{CompletedWord, InputDelta, WordBoundaryDetector};

pub mod orchestrator;
pub use orchestrator::{Completion, CorrectionOrchestrator, CorrectionResult, Outcome, PendingWord};

pub mod corrector;
pub use corrector::{Corrector, IdentityCorrector};

pub mod worker;
pub use worker::{CorrectionWorker, WorkerCompletion};

pub mod mutator;
pub use mutator::{CaretPreservingMutator, MutationOutcome};

pub mod presenter;
pub use presenter::{DismissReason, ScreenPoint, SuggestionPresenter, SuggestionState};

pub mod status;
pub use status::{Status, StatusIndicator};

pub mod context;
pub use context::EditorContext;

pub mod engine;
pub use engine::{CorrectionEngine, KeyEvent, KeyResult};

/// Editor-side configuration.
///
/// Only backend-agnostic fields live here. Service settings (host, model,
/// timeouts) belong in the backend crate's config, which flattens this one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Submit words automatically when a boundary is typed
    pub auto_trigger: bool,

    /// Append a space after an applied correction
    pub trailing_space: bool,

    /// Chars of preceding text sent along with a word (0 disables context)
    pub context_chars: usize,

    /// Delay before a success/error status falls back to idle (ms)
    pub status_reset_ms: u64,

    /// Vertical distance between the caret and the suggestion overlay
    pub suggestion_offset_y: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_trigger: true,
            trailing_space: false,
            context_chars: 0,
            status_reset_ms: 2000,
            suggestion_offset_y: 8.0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// Compare two words after normalization.
    pub fn same_word(a: &str, b: &str) -> bool {
        normalize(a) == normalize(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.auto_trigger);
        assert!(!config.trailing_space);
        assert_eq!(config.context_chars, 0);
        assert_eq!(config.status_reset_ms, 2000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("trailing_space = true\n").unwrap();
        assert!(config.trailing_space);
        assert!(config.auto_trigger);
    }

    #[test]
    fn test_toml_string_round_trip() {
        let config = Config {
            context_chars: 40,
            ..Config::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_normalize() {
        // decomposed e + combining acute
        assert_eq!(utils::normalize("  cafe\u{301} "), "café");
        assert!(utils::same_word("café", "cafe\u{301}"));
    }
}
