//! Splicing corrections into the document without losing the caret.
//!
//! [`CaretPreservingMutator::replace`] tries three strategies in order:
//!
//! 1. the selection, when its text is exactly the original word;
//! 2. the last occurrence of the original word in the linear text;
//! 3. a literal global substitution over the text runs of the document's
//!    raw markup (never inside tags or entities), followed by a re-parse.
//!
//! Replacing never fails. The returned [`MutationOutcome`] says which
//! strategy applied, and `NotFound` means the document was left untouched.

use std::ops::Range;

use regex::Regex;
use tracing::{debug, warn};

use crate::document::{escape_markup, Document, MARKUP_TOKEN};
use crate::state::EditorState;
use crate::Config;

/// Which strategy a replacement used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The selection held the word. `caret` is right after the insertion.
    Selection { caret: usize },
    /// The last occurrence starting at `offset` was replaced.
    LastOccurrence { offset: usize, caret: usize },
    /// Global markup substitution replaced `replacements` occurrences.
    Fallback { replacements: usize },
    /// The word was not found anywhere.
    NotFound,
}

impl MutationOutcome {
    pub fn applied(&self) -> bool {
        !matches!(self, MutationOutcome::NotFound)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CaretPreservingMutator {
    /// Append a space after the inserted correction.
    pub trailing_space: bool,
}

impl CaretPreservingMutator {
    pub fn new(trailing_space: bool) -> Self {
        Self { trailing_space }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.trailing_space)
    }

    /// Replace `original` with `corrected` in `state`.
    pub fn replace(&self, state: &mut EditorState, original: &str, corrected: &str) -> MutationOutcome {
        if original.is_empty() {
            return MutationOutcome::NotFound;
        }
        let insertion = self.insertion(corrected);
        let inserted_len = insertion.chars().count();

        let selection = state.selection();
        if !selection.is_collapsed() && state.selected_text() == original {
            let range = selection.range();
            let start = range.start;
            state.document.replace_range(range, &insertion);
            let caret = start + inserted_len;
            state.set_caret(caret);
            debug!(original, corrected, caret, "mutator: replaced selection");
            return MutationOutcome::Selection { caret };
        }

        if let Some(offset) = state.document.rfind(original) {
            let end = offset + original.chars().count();
            state.document.replace_range(offset..end, &insertion);
            let caret = offset + inserted_len;
            state.set_caret(caret);
            debug!(original, corrected, offset, caret, "mutator: replaced last occurrence");
            return MutationOutcome::LastOccurrence { offset, caret };
        }

        self.replace_in_markup(state, original, &insertion)
    }

    fn insertion(&self, corrected: &str) -> String {
        if self.trailing_space {
            format!("{corrected} ")
        } else {
            corrected.to_string()
        }
    }

    fn replace_in_markup(&self, state: &mut EditorState, original: &str, insertion: &str) -> MutationOutcome {
        let markup = state.document.to_markup();
        let pattern = match Regex::new(&regex::escape(&escape_markup(original))) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(error = %err, "mutator: could not build fallback pattern");
                return MutationOutcome::NotFound;
            }
        };

        let hits = text_run_matches(&pattern, &markup);
        if hits.is_empty() {
            debug!(original, "mutator: word not found");
            return MutationOutcome::NotFound;
        }

        let replacement = escape_markup(insertion);
        let mut replaced = String::with_capacity(markup.len());
        let mut cursor = 0;
        for hit in &hits {
            replaced.push_str(&markup[cursor..hit.start]);
            replaced.push_str(&replacement);
            cursor = hit.end;
        }
        replaced.push_str(&markup[cursor..]);

        let replacements = hits.len();
        match Document::from_markup(&replaced) {
            Ok(document) => {
                state.document = document;
                state.move_to_end();
                debug!(original, replacements, "mutator: global markup fallback");
                MutationOutcome::Fallback { replacements }
            }
            Err(err) => {
                warn!(error = %err, "mutator: fallback produced invalid markup, document untouched");
                MutationOutcome::NotFound
            }
        }
    }
}

/// Non-overlapping matches of a non-empty `pattern` that lie in text runs
/// of `markup`.
///
/// A match may cover whole entities but must not cut into a tag or an
/// entity, so `b` never hits `<b>` and `lt` never hits `&lt;`.
fn text_run_matches(pattern: &Regex, markup: &str) -> Vec<Range<usize>> {
    let tokens: Vec<Range<usize>> = MARKUP_TOKEN.find_iter(markup).map(|m| m.range()).collect();
    let cuts_token = |hit: &Range<usize>| {
        tokens.iter().any(|token| {
            let overlaps = token.start < hit.end && hit.start < token.end;
            let contained = hit.start <= token.start && token.end <= hit.end;
            overlaps && !contained
        })
    };

    let mut hits = Vec::new();
    let mut at = 0;
    while let Some(found) = pattern.find_at(markup, at) {
        let hit = found.range();
        if cuts_token(&hit) {
            // resume one char later, a valid hit may start inside the rejected one
            at = hit.start + markup[hit.start..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        at = hit.end;
        hits.push(hit);
    }
    hits
}
