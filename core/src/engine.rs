//! Correction engine with key event processing.
//!
//! The `CorrectionEngine` ties the pieces together: key events edit the
//! [`EditorState`] and feed the [`WordBoundaryDetector`]; completed words go
//! through the [`CorrectionOrchestrator`] to a [`CorrectionWorker`]; fresh
//! results are shown by the [`SuggestionPresenter`] and applied by the
//! [`CaretPreservingMutator`] on accept.
//!
//! Everything runs on the caller's thread except the corrector itself. The
//! platform calls `process_key()` for input and `poll()` from its event loop,
//! then reads `context()` to redraw.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::boundary::{is_word_boundary, CompletedWord, InputDelta, WordBoundaryDetector};
use crate::context::EditorContext;
use crate::corrector::Corrector;
use crate::document::{Document, StyleFlag};
use crate::error::MarkupError;
use crate::mutator::{CaretPreservingMutator, MutationOutcome};
use crate::orchestrator::{Completion, CorrectionOrchestrator, Outcome, PendingWord};
use crate::presenter::{DismissReason, ScreenPoint, SuggestionPresenter};
use crate::state::EditorState;
use crate::status::StatusIndicator;
use crate::worker::CorrectionWorker;
use crate::Config;

/// Key event types the engine can process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyEvent {
    /// Printable character
    Char(char),
    /// Space key
    Space,
    /// Enter/Return key (accepts a visible suggestion)
    Enter,
    /// Tab key (accepts a visible suggestion)
    Tab,
    /// Backspace key
    Backspace,
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,
    /// Home key
    Home,
    /// End key
    End,
    /// Escape key (rejects a visible suggestion)
    Escape,
    /// Mouse click on the text surface
    Click { inside_suggestion: bool },
    /// Ctrl + character (b, i, u toggle the typing style)
    Ctrl(char),
    /// Ask for a correction of the word before the caret
    CorrectLastWord,
}

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the engine
    Handled,
    /// Key was not handled (pass through to the platform)
    NotHandled,
}

pub struct CorrectionEngine {
    state: EditorState,
    detector: WordBoundaryDetector,
    orchestrator: CorrectionOrchestrator,
    presenter: SuggestionPresenter,
    mutator: CaretPreservingMutator,
    status: StatusIndicator,
    worker: CorrectionWorker,
    config: Config,
    context: EditorContext,

    /// Screen position of the caret, kept up to date by the platform.
    /// Suggestions are anchored just below it.
    pub caret_point: ScreenPoint,
}

impl CorrectionEngine {
    /// Create an engine running `corrector` on a worker thread.
    pub fn new(corrector: Box<dyn Corrector>, config: Config) -> std::io::Result<Self> {
        let worker = CorrectionWorker::spawn(corrector)?;
        info!(corrector = worker.corrector_name(), "correction engine started");
        let mut engine = Self {
            state: EditorState::new(),
            detector: WordBoundaryDetector::new(),
            orchestrator: CorrectionOrchestrator::new(),
            presenter: SuggestionPresenter::new(),
            mutator: CaretPreservingMutator::from_config(&config),
            status: StatusIndicator::new(Duration::from_millis(config.status_reset_ms)),
            worker,
            config,
            context: EditorContext::new(),
            caret_point: ScreenPoint::default(),
        };
        engine.sync_context();
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Direct access for platform-driven edits (caret placement after a
    /// click, selection changes). Call [`CorrectionEngine::refresh`] after.
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    /// Get a reference to the context for reading engine state.
    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn status(&self) -> &StatusIndicator {
        &self.status
    }

    /// True while a correction request is in flight.
    pub fn is_busy(&self) -> bool {
        self.orchestrator.is_busy()
    }

    /// Replace the document with parsed `markup`, caret at the end.
    pub fn load_markup(&mut self, markup: &str) -> Result<(), MarkupError> {
        let document = Document::from_markup(markup)?;
        self.reset();
        self.state = EditorState::with_document(document);
        self.sync_context();
        Ok(())
    }

    /// Drop the document, any suggestion and anything in flight.
    pub fn reset(&mut self) {
        self.orchestrator.invalidate();
        self.detector.reset();
        self.presenter.dismiss(DismissReason::Reject);
        self.status.idle();
        self.state = EditorState::new();
        self.sync_context();
    }

    /// Re-read the editor state into the context.
    pub fn refresh(&mut self) {
        self.sync_context();
    }

    /// Process a key event and update the context.
    ///
    /// Returns `KeyResult::Handled` if the engine consumed the key,
    /// or `KeyResult::NotHandled` if the platform should handle it.
    pub fn process_key(&mut self, key: KeyEvent) -> KeyResult {
        if self.presenter.is_visible() {
            match key {
                KeyEvent::Enter | KeyEvent::Tab => {
                    self.accept_suggestion();
                    return KeyResult::Handled;
                }
                KeyEvent::Escape => {
                    self.dismiss_suggestion(DismissReason::Escape);
                    self.sync_context();
                    return KeyResult::Handled;
                }
                KeyEvent::Click {
                    inside_suggestion: true,
                } => return KeyResult::Handled,
                KeyEvent::Click { .. } => {
                    self.dismiss_suggestion(DismissReason::ClickOutside);
                }
                _ => {
                    self.dismiss_suggestion(DismissReason::Keystroke);
                }
            }
        }

        let result = match key {
            KeyEvent::Char(ch) => self.type_char(ch),
            KeyEvent::Space => self.type_char(' '),
            KeyEvent::Enter => self.type_char('\n'),
            KeyEvent::Tab => self.type_char('\t'),
            KeyEvent::Backspace => {
                let ranged = !self.state.selection().is_collapsed();
                if self.state.delete_backward() {
                    if ranged {
                        // a whole selection went, the buffer no longer mirrors the text
                        self.detector.clear_buffer();
                        self.detector.forget_last();
                    } else {
                        self.detector.feed(InputDelta::Backspace, self.state.caret());
                    }
                    KeyResult::Handled
                } else {
                    KeyResult::NotHandled
                }
            }
            KeyEvent::Left | KeyEvent::Right | KeyEvent::Home | KeyEvent::End => {
                match key {
                    KeyEvent::Left => {
                        self.state.move_left();
                    }
                    KeyEvent::Right => {
                        self.state.move_right();
                    }
                    KeyEvent::Home => self.state.move_to_start(),
                    _ => self.state.move_to_end(),
                }
                // the buffered word no longer ends at the caret
                self.detector.clear_buffer();
                KeyResult::Handled
            }
            KeyEvent::Escape => KeyResult::NotHandled,
            KeyEvent::Click { .. } => {
                self.detector.clear_buffer();
                KeyResult::NotHandled
            }
            KeyEvent::Ctrl(ch) => match ch.to_ascii_lowercase() {
                'b' => self.toggle(StyleFlag::Bold),
                'i' => self.toggle(StyleFlag::Italic),
                'u' => self.toggle(StyleFlag::Underline),
                _ => KeyResult::NotHandled,
            },
            KeyEvent::CorrectLastWord => {
                if self.correct_last_word() {
                    KeyResult::Handled
                } else {
                    KeyResult::NotHandled
                }
            }
        };

        self.sync_context();
        result
    }

    /// Collect finished corrections and expire the status indicator.
    /// Returns the number of completions processed.
    pub fn poll(&mut self) -> usize {
        self.poll_at(Instant::now())
    }

    /// [`CorrectionEngine::poll`] with an explicit clock.
    pub fn poll_at(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Some(done) = self.worker.try_recv() {
            let completion = self.orchestrator.complete(done.sequence_id, done.result);
            self.handle_completion(completion, now);
            handled += 1;
        }
        let expired = self.status.tick(now);
        if handled > 0 || expired {
            self.sync_context();
        }
        handled
    }

    /// Apply the visible suggestion.
    pub fn accept_suggestion(&mut self) -> Option<MutationOutcome> {
        let outcome = self.presenter.accept(&mut self.state, &self.mutator)?;
        let now = Instant::now();
        if outcome.applied() {
            self.status.success("Correction applied", now);
        } else {
            warn!("accepted suggestion no longer matches the document");
            self.status.error("Correction failed", now);
        }
        self.detector.clear_buffer();
        self.sync_context();
        Some(outcome)
    }

    /// Hide the visible suggestion without applying it.
    pub fn reject_suggestion(&mut self) -> bool {
        let dismissed = self.dismiss_suggestion(DismissReason::Reject);
        self.sync_context();
        dismissed
    }

    /// Insert `text` at the caret, replacing the selection. One trailing
    /// space is stripped. Returns the offset the text landed at.
    pub fn insert_text(&mut self, text: &str) -> Option<usize> {
        let text = text.strip_suffix(' ').unwrap_or(text);
        if text.is_empty() {
            return None;
        }
        self.dismiss_suggestion(DismissReason::Keystroke);

        let start = self.state.insert_at_caret(text);
        let mut completed = None;
        for (i, ch) in text.chars().enumerate() {
            if let Some(word) = self.detector.feed(InputDelta::Char(ch), start + i) {
                completed = Some(word);
            }
        }
        if let Some(word) = completed {
            self.maybe_submit(word);
        }
        self.sync_context();
        Some(start)
    }

    /// Submit the word ending before the caret (skipping trailing boundary
    /// characters). Returns false when there is no such word.
    pub fn correct_last_word(&mut self) -> bool {
        let caret = self.state.caret();
        let before: Vec<char> = self.state.document.slice(0..caret).chars().collect();
        let end = before
            .iter()
            .rposition(|ch| !is_word_boundary(*ch))
            .map_or(0, |i| i + 1);
        let start = before[..end]
            .iter()
            .rposition(|ch| is_word_boundary(*ch))
            .map_or(0, |i| i + 1);
        if start == end {
            return false;
        }

        let text: String = before[start..end].iter().collect();
        self.detector.clear_buffer();
        self.detector.remember(&text);
        self.submit(CompletedWord {
            text,
            origin: start,
        });
        self.sync_context();
        true
    }

    fn type_char(&mut self, ch: char) -> KeyResult {
        let offset = self.state.insert_at_caret(ch.encode_utf8(&mut [0; 4]));
        if let Some(word) = self.detector.feed(InputDelta::Char(ch), offset) {
            self.maybe_submit(word);
        }
        KeyResult::Handled
    }

    fn toggle(&mut self, flag: StyleFlag) -> KeyResult {
        self.state.toggle_style(flag);
        KeyResult::Handled
    }

    fn maybe_submit(&mut self, word: CompletedWord) {
        if self.config.auto_trigger {
            self.submit(word);
        }
    }

    fn submit(&mut self, word: CompletedWord) {
        let context = self.context_before(word.origin);
        debug!(word = %word.text, origin = word.origin, "submitting word");
        self.status.checking();
        if let Some(pending) = self.orchestrator.submit(word.text, word.origin, context) {
            self.dispatch(pending);
        }
    }

    fn dispatch(&mut self, pending: PendingWord) {
        let sequence_id = pending.sequence_id;
        if let Err(err) = self.worker.dispatch(pending) {
            warn!(error = %err, sequence_id, "could not hand word to worker");
            let completion = self.orchestrator.complete(sequence_id, Err(err));
            self.handle_completion(completion, Instant::now());
        }
    }

    fn handle_completion(&mut self, completion: Completion, now: Instant) {
        match completion.outcome {
            Outcome::Suggest(result) => {
                debug!(
                    original = %result.original,
                    corrected = %result.corrected,
                    sequence_id = result.sequence_id,
                    "suggestion ready"
                );
                let anchor = self.caret_point.below(self.config.suggestion_offset_y);
                self.presenter.show(result, anchor);
                self.status.suggestion();
            }
            Outcome::Unchanged => self.status.success("No correction needed", now),
            Outcome::Failed(err) => {
                warn!(error = %err, "correction failed");
                self.status.error(err.user_message(), now);
            }
            Outcome::Stale => {}
        }

        if let Some(next) = completion.next {
            self.dispatch(next);
        }
    }

    fn dismiss_suggestion(&mut self, reason: DismissReason) -> bool {
        let dismissed = self.presenter.dismiss(reason);
        if dismissed {
            self.status.idle();
        }
        dismissed
    }

    /// Up to `context_chars` chars of text before `origin`.
    fn context_before(&self, origin: usize) -> Option<String> {
        let window = self.config.context_chars;
        if window == 0 {
            return None;
        }
        let context = self
            .state
            .document
            .slice(origin.saturating_sub(window)..origin);
        let context = context.trim();
        (!context.is_empty()).then(|| context.to_string())
    }

    fn sync_context(&mut self) {
        let ctx = &mut self.context;
        ctx.fragments = self.state.document.fragments().to_vec();
        ctx.markup = self.state.document.to_markup();
        ctx.text = self.state.document.text();
        ctx.caret = self.state.caret();
        ctx.caret_position = self.state.caret_position();
        ctx.suggestion = self.presenter.current().cloned();
        ctx.status = self.status.status().clone();
        ctx.status_text = self.status.label();
        ctx.busy = self.orchestrator.is_busy();
    }
}

impl std::fmt::Debug for CorrectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionEngine")
            .field("state", &self.state)
            .field("orchestrator", &self.orchestrator)
            .field("presenter", &self.presenter)
            .field("corrector", &self.worker.corrector_name())
            .finish()
    }
}
