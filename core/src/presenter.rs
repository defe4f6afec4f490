//! Suggestion overlay state.
//!
//! The presenter is either hidden or shows exactly one suggestion anchored
//! at the screen point the caret had when it was shown. Rendering is left to
//! the platform; it reads [`SuggestionPresenter::current`].

use serde::{Deserialize, Serialize};

use crate::mutator::{CaretPreservingMutator, MutationOutcome};
use crate::orchestrator::CorrectionResult;
use crate::state::EditorState;

/// Screen coordinates in platform units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point shifted down by `dy`.
    pub fn below(self, dy: f32) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }
}

/// A visible suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionState {
    pub anchor: ScreenPoint,
    pub original: String,
    pub corrected: String,
    pub sequence_id: u64,
}

/// Why a suggestion was hidden without being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Reject,
    Escape,
    ClickOutside,
    Keystroke,
}

#[derive(Debug, Default)]
pub struct SuggestionPresenter {
    current: Option<SuggestionState>,
}

impl SuggestionPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `result` at `anchor`, replacing whatever was visible.
    /// Returns the replaced suggestion.
    pub fn show(&mut self, result: CorrectionResult, anchor: ScreenPoint) -> Option<SuggestionState> {
        self.current.replace(SuggestionState {
            anchor,
            original: result.original,
            corrected: result.corrected,
            sequence_id: result.sequence_id,
        })
    }

    /// Apply the visible suggestion and hide it. `None` when hidden.
    pub fn accept(
        &mut self,
        state: &mut EditorState,
        mutator: &CaretPreservingMutator,
    ) -> Option<MutationOutcome> {
        let suggestion = self.current.take()?;
        Some(mutator.replace(state, &suggestion.original, &suggestion.corrected))
    }

    /// Hide without touching the document. Returns whether anything was visible.
    pub fn dismiss(&mut self, reason: DismissReason) -> bool {
        match self.current.take() {
            Some(suggestion) => {
                tracing::debug!(?reason, original = %suggestion.original, "presenter: dismissed");
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&SuggestionState> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn result(original: &str, corrected: &str, sequence_id: u64) -> CorrectionResult {
        CorrectionResult {
            original: original.into(),
            corrected: corrected.into(),
            sequence_id,
        }
    }

    #[test]
    fn test_show_replaces_previous() {
        let mut presenter = SuggestionPresenter::new();
        assert!(presenter.show(result("teh", "the", 1), ScreenPoint::new(1.0, 2.0)).is_none());
        let old = presenter.show(result("wrold", "world", 2), ScreenPoint::new(5.0, 2.0));
        assert_eq!(old.map(|s| s.original), Some("teh".to_string()));
        let current = presenter.current().unwrap();
        assert_eq!(current.corrected, "world");
        assert_eq!(current.anchor, ScreenPoint::new(5.0, 2.0));
    }

    #[test]
    fn test_accept_mutates_and_hides() {
        let mut presenter = SuggestionPresenter::new();
        let mut state = EditorState::with_document(Document::from_text("so teh "));
        presenter.show(result("teh", "the", 1), ScreenPoint::default());

        let outcome = presenter.accept(&mut state, &CaretPreservingMutator::default());
        assert_eq!(outcome, Some(MutationOutcome::LastOccurrence { offset: 3, caret: 6 }));
        assert_eq!(state.document.text(), "so the ");
        assert!(!presenter.is_visible());
        assert_eq!(presenter.accept(&mut state, &CaretPreservingMutator::default()), None);
    }

    #[test]
    fn test_dismiss_leaves_document() {
        let mut presenter = SuggestionPresenter::new();
        presenter.show(result("teh", "the", 1), ScreenPoint::default());
        assert!(presenter.dismiss(DismissReason::Escape));
        assert!(!presenter.dismiss(DismissReason::Reject));
    }

    #[test]
    fn test_anchor_below() {
        assert_eq!(ScreenPoint::new(3.0, 4.0).below(8.0), ScreenPoint::new(3.0, 12.0));
    }
}
