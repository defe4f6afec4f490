//! Styled text fragments and the linear offset <-> caret mapping.
//!
//! A [`Document`] is an ordered run of [`Fragment`]s. Concatenating the
//! fragment texts yields the document's linear text; all offsets handed to or
//! returned from this module are counted in `char`s of that linear text.
//!
//! A [`CaretPosition`] names a fragment and an offset inside it. The mapping
//! walks the fragments in order and treats each fragment as a half-open
//! interval, so an offset sitting exactly between two fragments resolves to
//! the start of the second one. Offsets past the end clamp to the end.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MarkupError;

/// A style tag or an entity in raw markup. Everything between tokens is text.
pub(crate) static MARKUP_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([biu])>|&(amp|lt|gt);").expect("markup token pattern is valid")
});

/// Formatting applied to a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// A single formatting attribute, used for toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
}

impl StyleFlag {
    const ALL: [StyleFlag; 3] = [StyleFlag::Bold, StyleFlag::Italic, StyleFlag::Underline];

    fn tag(self) -> char {
        match self {
            StyleFlag::Bold => 'b',
            StyleFlag::Italic => 'i',
            StyleFlag::Underline => 'u',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'b' => Some(StyleFlag::Bold),
            'i' => Some(StyleFlag::Italic),
            'u' => Some(StyleFlag::Underline),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            StyleFlag::Bold => 0,
            StyleFlag::Italic => 1,
            StyleFlag::Underline => 2,
        }
    }
}

impl Style {
    /// Check whether `flag` is set.
    pub fn has(&self, flag: StyleFlag) -> bool {
        match flag {
            StyleFlag::Bold => self.bold,
            StyleFlag::Italic => self.italic,
            StyleFlag::Underline => self.underline,
        }
    }

    /// Set or clear `flag`.
    pub fn set(&mut self, flag: StyleFlag, on: bool) {
        match flag {
            StyleFlag::Bold => self.bold = on,
            StyleFlag::Italic => self.italic = on,
            StyleFlag::Underline => self.underline = on,
        }
    }

    /// Return a copy with `flag` flipped.
    pub fn toggled(mut self, flag: StyleFlag) -> Self {
        let on = self.has(flag);
        self.set(flag, !on);
        self
    }
}

/// A contiguous run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    style: Style,
}

impl Fragment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Unformatted fragment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// View-layer location: a fragment index and a char offset inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaretPosition {
    pub fragment: usize,
    pub offset: usize,
}

/// Ordered sequence of styled fragments forming one logical text stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fragments: Vec<Fragment>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding a single unformatted fragment.
    pub fn from_text(text: &str) -> Self {
        Self::from_fragments([Fragment::plain(text)])
    }

    /// Create a document from fragments as given. Empty fragments are dropped,
    /// neighbours sharing a style are kept apart.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        Self {
            fragments: fragments.into_iter().filter(|f| !f.is_empty()).collect(),
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Length of the linear text in chars.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Concatenation of all fragment texts.
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Linear text in `range`, clamped to the document.
    pub fn slice(&self, range: Range<usize>) -> String {
        let (start, end) = self.clamp_range(range);
        self.text().chars().skip(start).take(end - start).collect()
    }

    /// Char offset of the last occurrence of `needle` in the linear text.
    pub fn rfind(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let text = self.text();
        text.rfind(needle).map(|byte| text[..byte].chars().count())
    }

    /// Map a linear offset to a caret position.
    ///
    /// Offsets on a fragment boundary resolve to the start of the following
    /// fragment; offsets past the end clamp to the end of the last fragment.
    pub fn caret_at(&self, offset: usize) -> CaretPosition {
        let mut acc = 0;
        for (index, fragment) in self.fragments.iter().enumerate() {
            let len = fragment.len();
            if offset < acc + len {
                return CaretPosition {
                    fragment: index,
                    offset: offset - acc,
                };
            }
            acc += len;
        }

        match self.fragments.len() {
            0 => CaretPosition::default(),
            n => CaretPosition {
                fragment: n - 1,
                offset: self.fragments[n - 1].len(),
            },
        }
    }

    /// Map a caret position back to a linear offset, clamping out-of-range parts.
    pub fn offset_of(&self, caret: CaretPosition) -> usize {
        let Some(fragment) = self.fragments.get(caret.fragment) else {
            return self.len();
        };
        let before: usize = self.fragments[..caret.fragment]
            .iter()
            .map(Fragment::len)
            .sum();
        before + caret.offset.min(fragment.len())
    }

    /// Style a char inserted at `offset` would inherit: the char before it,
    /// or the first fragment when inserting at the very start.
    pub fn style_before(&self, offset: usize) -> Style {
        let offset = offset.min(self.len());
        if offset == 0 {
            return self.fragments.first().map(Fragment::style).unwrap_or_default();
        }
        self.fragments[self.caret_at(offset - 1).fragment].style
    }

    /// Insert `text` with `style` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        let offset = offset.min(self.len());
        let index = self.split_at(offset);
        self.fragments.insert(index, Fragment::new(text, style));
        self.normalize();
    }

    /// Delete the chars in `range`.
    pub fn delete(&mut self, range: Range<usize>) {
        let (start, end) = self.clamp_range(range);
        if start == end {
            return;
        }
        let first = self.split_at(start);
        let last = self.split_at(end);
        self.fragments.drain(first..last);
        self.normalize();
    }

    /// Replace the chars in `range` with `text`.
    ///
    /// The replacement takes the style of the first replaced char (or of the
    /// char before an empty range); fragments outside the range keep theirs.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) {
        let (start, end) = self.clamp_range(range);
        let style = if start < end {
            self.fragments[self.caret_at(start).fragment].style
        } else {
            self.style_before(start)
        };

        let first = self.split_at(start);
        let last = self.split_at(end);
        let replacement = (!text.is_empty()).then(|| Fragment::new(text, style));
        self.fragments.splice(first..last, replacement);
        self.normalize();
    }

    /// Toggle `flag` over `range`. The flag is set unless every char in the
    /// range already carries it. Returns the new state of the flag.
    pub fn toggle_style(&mut self, range: Range<usize>, flag: StyleFlag) -> bool {
        let (start, end) = self.clamp_range(range);
        if start == end {
            return false;
        }
        let first = self.split_at(start);
        let last = self.split_at(end);
        let enable = !self.fragments[first..last]
            .iter()
            .all(|f| f.style.has(flag));
        for fragment in &mut self.fragments[first..last] {
            fragment.style.set(flag, enable);
        }
        self.normalize();
        enable
    }

    /// Serialize to raw markup: `<b>`, `<i>`, `<u>` tags around fragments,
    /// with `&`, `<` and `>` escaped in text.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            for flag in StyleFlag::ALL {
                if fragment.style.has(flag) {
                    out.push('<');
                    out.push(flag.tag());
                    out.push('>');
                }
            }
            out.push_str(&escape_markup(&fragment.text));
            for flag in StyleFlag::ALL.iter().rev() {
                if fragment.style.has(*flag) {
                    out.push_str("</");
                    out.push(flag.tag());
                    out.push('>');
                }
            }
        }
        out
    }

    /// Parse raw markup produced by [`Document::to_markup`] (tags may nest in
    /// any order). Stray `<`, `>`, `&` and unbalanced tags are rejected.
    pub fn from_markup(markup: &str) -> Result<Self, MarkupError> {
        let mut depth = [0usize; 3];
        let mut fragments = Vec::new();
        let mut current = String::new();
        let mut cursor = 0;

        for caps in MARKUP_TOKEN.captures_iter(markup) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_plain(&mut current, &markup[cursor..whole.start()], cursor)?;
            cursor = whole.end();

            if let Some(entity) = caps.get(3) {
                current.push(match entity.as_str() {
                    "amp" => '&',
                    "lt" => '<',
                    _ => '>',
                });
                continue;
            }

            flush(&mut current, &depth, &mut fragments);
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let Some(flag) = caps
                .get(2)
                .and_then(|m| m.as_str().chars().next())
                .and_then(StyleFlag::from_tag)
            else {
                continue;
            };
            let slot = &mut depth[flag.index()];
            if closing {
                if *slot == 0 {
                    return Err(MarkupError::UnbalancedClose(flag.tag()));
                }
                *slot -= 1;
            } else {
                *slot += 1;
            }
        }
        push_plain(&mut current, &markup[cursor..], cursor)?;
        flush(&mut current, &depth, &mut fragments);

        if let Some(flag) = StyleFlag::ALL.into_iter().find(|f| depth[f.index()] > 0) {
            return Err(MarkupError::Unclosed(flag.tag()));
        }
        Ok(Self::from_fragments(fragments))
    }

    fn clamp_range(&self, range: Range<usize>) -> (usize, usize) {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        (start, end)
    }

    /// Ensure a fragment boundary at `offset` and return the index of the
    /// fragment starting there (or `fragments.len()` at the end).
    fn split_at(&mut self, offset: usize) -> usize {
        let mut acc = 0;
        for index in 0..self.fragments.len() {
            if offset == acc {
                return index;
            }
            let len = self.fragments[index].len();
            if offset < acc + len {
                let at = byte_index(&self.fragments[index].text, offset - acc);
                let right = self.fragments[index].text.split_off(at);
                let style = self.fragments[index].style;
                self.fragments.insert(index + 1, Fragment::new(right, style));
                return index + 1;
            }
            acc += len;
        }
        self.fragments.len()
    }

    /// Drop empty fragments and merge neighbours that share a style.
    fn normalize(&mut self) {
        let mut merged: Vec<Fragment> = Vec::with_capacity(self.fragments.len());
        for fragment in self.fragments.drain(..) {
            if fragment.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.style == fragment.style => last.text.push_str(&fragment.text),
                _ => merged.push(fragment),
            }
        }
        self.fragments = merged;
    }
}

/// Escape `&`, `<` and `>` for inclusion in raw markup.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte)
}

fn push_plain(current: &mut String, text: &str, base: usize) -> Result<(), MarkupError> {
    if let Some((at, ch)) = text
        .char_indices()
        .find(|(_, ch)| matches!(ch, '<' | '>' | '&'))
    {
        return Err(MarkupError::Stray(ch, base + at));
    }
    current.push_str(text);
    Ok(())
}

fn flush(current: &mut String, depth: &[usize; 3], out: &mut Vec<Fragment>) {
    if current.is_empty() {
        return;
    }
    let style = Style {
        bold: depth[0] > 0,
        italic: depth[1] > 0,
        underline: depth[2] > 0,
    };
    out.push(Fragment::new(std::mem::take(current), style));
}
