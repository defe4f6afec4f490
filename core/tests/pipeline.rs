// core/tests/pipeline.rs
//
// Integration tests for the correction pipeline as the platform drives it.
//
// Tests cover:
// - Typed words reach the corrector once per boundary crossing
// - Words superseded while a request is in flight are never sent
// - Only the most recent word's correction is shown
// - Accepting a suggestion splices it in place and keeps the caret
// - Clicks outside the overlay dismiss it

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use libtypo_core::{
    Config, CorrectionEngine, CorrectionError, Corrector, KeyEvent, KeyResult, MutationOutcome,
};

/// Corrector that records every word it is asked about.
struct RecordingCorrector {
    seen: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl Corrector for RecordingCorrector {
    fn correct(&mut self, word: &str, _context: Option<&str>) -> Result<String, CorrectionError> {
        self.seen.lock().unwrap().push(word.to_string());
        thread::sleep(self.delay);
        Ok(word.to_uppercase())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn engine_with_log(delay: Duration) -> (CorrectionEngine, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let corrector = RecordingCorrector {
        seen: Arc::clone(&seen),
        delay,
    };
    let engine = CorrectionEngine::new(Box::new(corrector), Config::default()).unwrap();
    (engine, seen)
}

fn type_text(engine: &mut CorrectionEngine, text: &str) {
    for ch in text.chars() {
        let key = match ch {
            ' ' => KeyEvent::Space,
            '\n' => KeyEvent::Enter,
            other => KeyEvent::Char(other),
        };
        engine.process_key(key);
    }
}

fn settle(engine: &mut CorrectionEngine) {
    for _ in 0..1000 {
        engine.poll();
        if !engine.is_busy() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("pipeline never settled");
}

#[test]
fn test_superseded_word_is_never_sent() {
    let (mut engine, seen) = engine_with_log(Duration::from_millis(20));

    // aa goes out immediately; bb and cc arrive while it is in flight
    type_text(&mut engine, "aa bb cc ");
    assert!(engine.is_busy());
    settle(&mut engine);

    assert_eq!(*seen.lock().unwrap(), vec!["aa".to_string(), "cc".to_string()]);
    let suggestion = engine.context().suggestion.clone().expect("suggestion for cc");
    assert_eq!(suggestion.original, "cc");
    assert_eq!(suggestion.corrected, "CC");
}

#[test]
fn test_one_request_per_boundary_crossing() {
    let (mut engine, seen) = engine_with_log(Duration::ZERO);

    type_text(&mut engine, "hi");
    settle(&mut engine);
    assert!(seen.lock().unwrap().is_empty());

    type_text(&mut engine, ",  ");
    settle(&mut engine);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_accept_in_the_middle_of_text() {
    let fixer = |word: &str, _: Option<&str>| -> Result<String, CorrectionError> {
        Ok(if word == "teh" { "the".into() } else { word.into() })
    };
    let mut engine = CorrectionEngine::new(Box::new(fixer), Config::default()).unwrap();

    type_text(&mut engine, "I went teh ");
    settle(&mut engine);
    assert!(engine.context().has_suggestion());

    let outcome = engine.accept_suggestion();
    assert_eq!(
        outcome,
        Some(MutationOutcome::LastOccurrence {
            offset: 7,
            caret: 10
        })
    );
    assert_eq!(engine.context().text, "I went the ");
    assert_eq!(engine.context().caret, 10);
}

#[test]
fn test_click_outside_dismisses() {
    let (mut engine, _seen) = engine_with_log(Duration::ZERO);
    type_text(&mut engine, "word ");
    settle(&mut engine);
    assert!(engine.context().has_suggestion());

    assert_eq!(
        engine.process_key(KeyEvent::Click {
            inside_suggestion: true
        }),
        KeyResult::Handled
    );
    assert!(engine.context().has_suggestion());

    engine.process_key(KeyEvent::Click {
        inside_suggestion: false,
    });
    assert!(!engine.context().has_suggestion());
    assert_eq!(engine.context().text, "word ");
}

#[test]
fn test_edited_word_is_resubmitted() {
    let (mut engine, seen) = engine_with_log(Duration::ZERO);
    type_text(&mut engine, "ab ");
    settle(&mut engine);
    engine.process_key(KeyEvent::Escape);

    // same word again, but edited on the way
    type_text(&mut engine, "abx");
    engine.process_key(KeyEvent::Backspace);
    type_text(&mut engine, " ");
    settle(&mut engine);

    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn test_repeated_word_is_sent_once() {
    let (mut engine, seen) = engine_with_log(Duration::ZERO);
    type_text(&mut engine, "ab ab ");
    settle(&mut engine);
    assert_eq!(*seen.lock().unwrap(), vec!["ab".to_string()]);
}
