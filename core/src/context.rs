//! Editor context for platform communication.
//!
//! The `EditorContext` struct is a plain data container with public fields.
//! After calling `process_key()` or `poll()` on a
//! [`CorrectionEngine`](crate::engine::CorrectionEngine), the platform reads
//! these fields to redraw the text surface, the suggestion overlay and the
//! status line.
//!
//! No callbacks, no traits. Platform code reads the fields directly.

use crate::document::{CaretPosition, Fragment};
use crate::presenter::SuggestionState;
use crate::status::Status;

/// Snapshot of everything the platform renders.
///
/// # Fields
///
/// - `markup`: document as raw `<b>/<i>/<u>` markup
/// - `text`: linear text without formatting
/// - `caret`: caret as a linear char offset
/// - `caret_position`: caret as a fragment position
/// - `suggestion`: visible suggestion, if any
/// - `status` / `status_text`: indicator state and its label
/// - `busy`: a correction request is in flight
#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    /// Styled fragments, in order
    pub fragments: Vec<Fragment>,

    /// Raw markup of the document
    pub markup: String,

    /// Linear text of the document
    pub text: String,

    /// Caret as a linear char offset
    pub caret: usize,

    /// Caret as a fragment position
    pub caret_position: CaretPosition,

    /// Suggestion overlay contents (None when hidden)
    pub suggestion: Option<SuggestionState>,

    /// Status indicator state
    pub status: Status,

    /// Status indicator label
    pub status_text: String,

    /// A correction request is outstanding
    pub busy: bool,
}

impl EditorContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the suggestion overlay should be drawn.
    pub fn has_suggestion(&self) -> bool {
        self.suggestion.is_some()
    }

    /// Suggestion line as shown in the overlay, e.g. `teh → the`.
    pub fn suggestion_text(&self) -> Option<String> {
        self.suggestion
            .as_ref()
            .map(|s| format!("{} → {}", s.original, s.corrected))
    }
}
