//! The seam between the editor core and whatever performs corrections.
//!
//! `libtypo-core` never talks to the network. A backend crate implements
//! [`Corrector`] and hands a boxed instance to the engine, which runs it on
//! a [`crate::worker::CorrectionWorker`] thread.

use crate::error::CorrectionError;

/// Turns a single word into its corrected form.
pub trait Corrector: Send + 'static {
    /// Correct `word`. `context` is the text that precedes it in the
    /// document, when the caller has any to offer.
    ///
    /// Returning the word unchanged is a valid answer.
    fn correct(&mut self, word: &str, context: Option<&str>) -> Result<String, CorrectionError>;

    /// Short name used in log lines.
    fn name(&self) -> &str;
}

/// Corrector that returns every word as-is.
///
/// Used when no backend is configured and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCorrector;

impl Corrector for IdentityCorrector {
    fn correct(&mut self, word: &str, _context: Option<&str>) -> Result<String, CorrectionError> {
        Ok(word.to_string())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

impl<F> Corrector for F
where
    F: FnMut(&str, Option<&str>) -> Result<String, CorrectionError> + Send + 'static,
{
    fn correct(&mut self, word: &str, context: Option<&str>) -> Result<String, CorrectionError> {
        self(word, context)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
