//! Single-flight correction orchestration.
//!
//! At most one [`PendingWord`] is in flight at a time. Words submitted while
//! a request is outstanding replace each other in a one-slot queue, so only
//! the most recent one is ever dispatched. Every submission gets a fresh,
//! monotonically increasing sequence id; a completion whose id is not the
//! latest one is stale and dropped without touching the UI.
//!
//! The orchestrator does no I/O. [`CorrectionOrchestrator::submit`] and
//! [`CorrectionOrchestrator::complete`] hand back the word that should be
//! dispatched next, and the caller (see [`crate::engine::CorrectionEngine`])
//! routes it to a worker.

use crate::error::CorrectionError;
use crate::utils::same_word;

/// A word awaiting or undergoing correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWord {
    pub text: String,
    /// Linear offset of the word's first char when it was submitted.
    pub origin: usize,
    /// Text preceding the word, sent along as a hint.
    pub context: Option<String>,
    pub sequence_id: u64,
}

/// A fresh correction that differs from the original word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionResult {
    pub original: String,
    pub corrected: String,
    pub sequence_id: u64,
}

/// What a completion means for the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Fresh and different: show it.
    Suggest(CorrectionResult),
    /// Fresh, but the service returned the word unchanged.
    Unchanged,
    /// Fresh, but the request failed. The pipeline stays usable.
    Failed(CorrectionError),
    /// A newer word was submitted since; ignore.
    Stale,
}

/// Result of [`CorrectionOrchestrator::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub outcome: Outcome,
    /// Queued word that is now in flight and must be dispatched.
    pub next: Option<PendingWord>,
}

#[derive(Debug, Default)]
pub struct CorrectionOrchestrator {
    next_sequence: u64,
    latest: Option<u64>,
    in_flight: Option<PendingWord>,
    queued: Option<PendingWord>,
}

impl CorrectionOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a word. Returns it back when it should be dispatched right
    /// away; returns `None` when it was queued behind the in-flight request.
    pub fn submit(
        &mut self,
        text: impl Into<String>,
        origin: usize,
        context: Option<String>,
    ) -> Option<PendingWord> {
        self.next_sequence += 1;
        let word = PendingWord {
            text: text.into(),
            origin,
            context,
            sequence_id: self.next_sequence,
        };
        self.latest = Some(word.sequence_id);

        if self.in_flight.is_some() {
            if let Some(dropped) = self.queued.replace(word) {
                tracing::debug!(
                    word = %dropped.text,
                    sequence_id = dropped.sequence_id,
                    "orchestrator: queued word superseded"
                );
            }
            return None;
        }

        self.in_flight = Some(word.clone());
        Some(word)
    }

    /// Record the completion of request `sequence_id`.
    pub fn complete(
        &mut self,
        sequence_id: u64,
        result: Result<String, CorrectionError>,
    ) -> Completion {
        let finished = match self.in_flight.take() {
            Some(word) if word.sequence_id == sequence_id => word,
            other => {
                // not the request we are waiting for
                self.in_flight = other;
                return Completion {
                    outcome: Outcome::Stale,
                    next: None,
                };
            }
        };

        let next = self.queued.take();
        self.in_flight = next.clone();

        let outcome = if self.latest != Some(sequence_id) {
            tracing::debug!(
                word = %finished.text,
                sequence_id,
                latest = ?self.latest,
                "orchestrator: stale result dropped"
            );
            Outcome::Stale
        } else {
            match result {
                Ok(corrected) if !same_word(&corrected, &finished.text) => Outcome::Suggest(CorrectionResult {
                    original: finished.text,
                    corrected,
                    sequence_id,
                }),
                Ok(_) => Outcome::Unchanged,
                Err(err) => Outcome::Failed(err),
            }
        };

        Completion { outcome, next }
    }

    /// Drop the queued word, if any.
    pub fn cancel_pending(&mut self) -> Option<PendingWord> {
        self.queued.take()
    }

    /// Make whatever is in flight stale and drop the queued word.
    pub fn invalidate(&mut self) {
        self.next_sequence += 1;
        self.latest = Some(self.next_sequence);
        self.queued = None;
    }

    /// True while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&PendingWord> {
        self.in_flight.as_ref()
    }

    pub fn queued(&self) -> Option<&PendingWord> {
        self.queued.as_ref()
    }

    /// Sequence id of the most recent submission.
    pub fn latest(&self) -> Option<u64> {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_submission_dispatches() {
        let mut orch = CorrectionOrchestrator::new();
        let word = orch.submit("teh", 0, None).expect("idle orchestrator dispatches");
        assert_eq!(word.sequence_id, 1);
        assert!(orch.is_busy());
    }

    #[test]
    fn test_fresh_result_is_suggested() {
        let mut orch = CorrectionOrchestrator::new();
        let word = orch.submit("teh", 0, None).unwrap();
        let done = orch.complete(word.sequence_id, Ok("the".into()));
        assert_eq!(
            done.outcome,
            Outcome::Suggest(CorrectionResult {
                original: "teh".into(),
                corrected: "the".into(),
                sequence_id: 1,
            })
        );
        assert_eq!(done.next, None);
        assert!(!orch.is_busy());
    }

    #[test]
    fn test_last_write_wins_while_busy() {
        let mut orch = CorrectionOrchestrator::new();
        let a = orch.submit("aa", 0, None).unwrap();
        assert!(orch.submit("bb", 3, None).is_none());
        assert!(orch.submit("cc", 6, None).is_none());
        assert_eq!(orch.queued().map(|w| w.text.as_str()), Some("cc"));

        let done = orch.complete(a.sequence_id, Ok("AA".into()));
        assert_eq!(done.outcome, Outcome::Stale);
        let c = done.next.expect("queued word dispatched");
        assert_eq!(c.text, "cc");
        assert_eq!(c.sequence_id, 3);

        let done = orch.complete(c.sequence_id, Ok("CC".into()));
        assert!(matches!(done.outcome, Outcome::Suggest(ref r) if r.corrected == "CC"));
    }

    #[test]
    fn test_unchanged_and_failed() {
        let mut orch = CorrectionOrchestrator::new();
        let w = orch.submit("fine", 0, None).unwrap();
        assert_eq!(
            orch.complete(w.sequence_id, Ok("fine".into())).outcome,
            Outcome::Unchanged
        );

        let w = orch.submit("oops", 5, None).unwrap();
        assert_eq!(
            orch.complete(w.sequence_id, Err(CorrectionError::Timeout)).outcome,
            Outcome::Failed(CorrectionError::Timeout)
        );

        // still usable afterwards
        assert!(orch.submit("next", 10, None).is_some());
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let mut orch = CorrectionOrchestrator::new();
        let w = orch.submit("teh", 0, None).unwrap();
        let done = orch.complete(w.sequence_id + 7, Ok("x".into()));
        assert_eq!(done.outcome, Outcome::Stale);
        assert!(orch.is_busy());
    }

    #[test]
    fn test_invalidate_makes_in_flight_stale() {
        let mut orch = CorrectionOrchestrator::new();
        let w = orch.submit("teh", 0, None).unwrap();
        orch.submit("queued", 4, None);
        orch.invalidate();
        let done = orch.complete(w.sequence_id, Ok("the".into()));
        assert_eq!(done.outcome, Outcome::Stale);
        assert_eq!(done.next, None);
    }
}
