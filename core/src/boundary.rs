//! Incremental word boundary detection.
//!
//! The detector sees one input delta at a time and buffers word characters
//! until a boundary character arrives. A completed word is emitted at most
//! once per boundary crossing, and never twice in a row for the same text
//! unless the word was edited in between.

/// Input delta fed to the detector for each edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDelta {
    /// A character was inserted.
    Char(char),
    /// The character before the caret was removed.
    Backspace,
    /// Any other edit that inserted no character.
    None,
}

/// A word that crossed a boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWord {
    pub text: String,
    /// Linear offset of the word's first char.
    pub origin: usize,
}

/// Whitespace or one of `. , ! ? ; :`.
pub fn is_word_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '.' | ',' | '!' | '?' | ';' | ':')
}

/// Accumulates characters since the last boundary.
#[derive(Debug, Clone, Default)]
pub struct WordBoundaryDetector {
    buffer: String,
    origin: usize,
    last_emitted: Option<String>,
}

impl WordBoundaryDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta. `offset` is the linear offset the delta applied at
    /// (for `Char`, the offset the char was inserted at).
    pub fn feed(&mut self, delta: InputDelta, offset: usize) -> Option<CompletedWord> {
        match delta {
            InputDelta::Char(ch) if is_word_boundary(ch) => self.finish_word(),
            InputDelta::Char(ch) => {
                if self.buffer.is_empty() {
                    self.origin = offset;
                }
                self.buffer.push(ch);
                None
            }
            InputDelta::Backspace => {
                self.buffer.pop();
                self.last_emitted = None;
                None
            }
            InputDelta::None => None,
        }
    }

    fn finish_word(&mut self) -> Option<CompletedWord> {
        if self.buffer.is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.buffer);
        if self.last_emitted.as_deref() == Some(text.as_str()) {
            tracing::trace!(word = %text, "boundary: same word as last emission, skipped");
            return None;
        }
        self.last_emitted = Some(text.clone());
        Some(CompletedWord {
            text,
            origin: self.origin,
        })
    }

    /// Characters buffered since the last boundary.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Most recently emitted word, if it has not been edited since.
    pub fn last_emitted(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }

    /// Record `word` as emitted without going through a boundary (manual
    /// correction requests use this so the next boundary does not repeat it).
    pub fn remember(&mut self, word: &str) {
        self.last_emitted = Some(word.to_string());
    }

    /// Forget the last emitted word so the same text may be emitted again.
    pub fn forget_last(&mut self) {
        self.last_emitted = None;
    }

    /// Drop buffered characters, keeping the last emitted word.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Drop everything.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.origin = 0;
        self.last_emitted = None;
    }
}
