//! Editor state: the document plus selection and typing style.
//!
//! Every mutation in the crate takes an `&mut EditorState` instead of
//! reaching for global UI state. Selection offsets are linear char offsets
//! into the document text and are kept clamped to `0..=document.len()`.

use std::ops::Range;

use crate::document::{CaretPosition, Document, Style, StyleFlag};

/// Selection as an anchor/head pair. Collapsed when both are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    /// Collapsed selection (a plain caret) at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Ordered range covered by the selection.
    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }
}

/// Document, selection and the style applied to newly typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub document: Document,
    selection: Selection,
    typing_style: Style,
}

impl EditorState {
    /// Empty state with the caret at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// State over `document` with the caret at its end.
    pub fn with_document(document: Document) -> Self {
        let end = document.len();
        Self {
            document,
            selection: Selection::caret(end),
            typing_style: Style::default(),
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Linear offset of the caret (selection head).
    pub fn caret(&self) -> usize {
        self.selection.head
    }

    /// Caret translated into a fragment position.
    pub fn caret_position(&self) -> CaretPosition {
        self.document.caret_at(self.selection.head)
    }

    /// Collapse the selection at `offset`, clamped to the document.
    pub fn set_caret(&mut self, offset: usize) {
        self.selection = Selection::caret(offset.min(self.document.len()));
    }

    /// Select from `anchor` to `head`, both clamped.
    pub fn select(&mut self, anchor: usize, head: usize) {
        let len = self.document.len();
        self.selection = Selection::new(anchor.min(len), head.min(len));
    }

    /// Text covered by the selection (empty when collapsed).
    pub fn selected_text(&self) -> String {
        self.document.slice(self.selection.range())
    }

    pub fn typing_style(&self) -> Style {
        self.typing_style
    }

    /// Flip `flag` for subsequently typed text, and over the selection if
    /// there is one.
    pub fn toggle_style(&mut self, flag: StyleFlag) {
        self.typing_style = self.typing_style.toggled(flag);
        if !self.selection.is_collapsed() {
            let on = self.document.toggle_style(self.selection.range(), flag);
            self.typing_style.set(flag, on);
        }
    }

    /// Replace the selection with `text` in the typing style and put the
    /// caret right after it. Returns the offset the text was inserted at.
    pub fn insert_at_caret(&mut self, text: &str) -> usize {
        let range = self.selection.range();
        let start = range.start;
        if !range.is_empty() {
            self.document.delete(range);
        }
        self.document.insert(start, text, self.typing_style);
        self.set_caret(start + text.chars().count());
        start
    }

    /// Delete the selection, or the char before a collapsed caret.
    /// Returns false when there was nothing to delete.
    pub fn delete_backward(&mut self) -> bool {
        let range = self.selection.range();
        if !range.is_empty() {
            let start = range.start;
            self.document.delete(range);
            self.set_caret(start);
            return true;
        }
        if range.start == 0 {
            return false;
        }
        let start = range.start - 1;
        self.document.delete(start..range.start);
        self.set_caret(start);
        true
    }

    /// Move the caret one char left, collapsing any selection to its start.
    pub fn move_left(&mut self) -> bool {
        let range = self.selection.range();
        if !range.is_empty() {
            self.set_caret(range.start);
            return true;
        }
        if range.start == 0 {
            return false;
        }
        self.set_caret(range.start - 1);
        true
    }

    /// Move the caret one char right, collapsing any selection to its end.
    pub fn move_right(&mut self) -> bool {
        let range = self.selection.range();
        if !range.is_empty() {
            self.set_caret(range.end);
            return true;
        }
        if range.end >= self.document.len() {
            return false;
        }
        self.set_caret(range.end + 1);
        true
    }

    pub fn move_to_start(&mut self) {
        self.set_caret(0);
    }

    pub fn move_to_end(&mut self) {
        self.set_caret(self.document.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_selection() {
        let mut state = EditorState::with_document(Document::from_text("I went teh store"));
        state.select(7, 10);
        assert_eq!(state.selected_text(), "teh");

        let at = state.insert_at_caret("to");
        assert_eq!(at, 7);
        assert_eq!(state.document.text(), "I went to store");
        assert_eq!(state.caret(), 9);
        assert!(state.selection().is_collapsed());
    }

    #[test]
    fn test_delete_backward() {
        let mut state = EditorState::with_document(Document::from_text("abc"));
        assert!(state.delete_backward());
        assert_eq!(state.document.text(), "ab");
        assert_eq!(state.caret(), 2);

        state.set_caret(0);
        assert!(!state.delete_backward());
    }

    #[test]
    fn test_caret_is_clamped() {
        let mut state = EditorState::with_document(Document::from_text("abc"));
        state.set_caret(40);
        assert_eq!(state.caret(), 3);
        state.select(10, 1);
        assert_eq!(state.selection().range(), 1..3);
    }

    #[test]
    fn test_movement() {
        let mut state = EditorState::with_document(Document::from_text("ab"));
        assert!(!state.move_right());
        assert!(state.move_left());
        assert_eq!(state.caret(), 1);
        state.move_to_start();
        assert!(!state.move_left());
        state.move_to_end();
        assert_eq!(state.caret(), 2);
    }

    #[test]
    fn test_toggle_style_applies_to_typing_and_selection() {
        let mut state = EditorState::with_document(Document::from_text("hello"));
        state.toggle_style(StyleFlag::Bold);
        state.insert_at_caret("!");
        assert_eq!(state.document.fragments().len(), 2);
        assert!(state.document.fragments()[1].style().bold);

        state.select(0, 5);
        state.toggle_style(StyleFlag::Bold);
        assert!(state.typing_style().bold);
        assert_eq!(state.document.fragments().len(), 1);
    }
}
