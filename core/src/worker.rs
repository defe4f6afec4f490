//! Background thread that owns a [`Corrector`].
//!
//! The event loop must never block on a correction request, so requests are
//! pushed over a channel to a dedicated thread and completions are collected
//! with [`CorrectionWorker::try_recv`].

use std::{
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use tracing::{debug, warn};

use crate::corrector::Corrector;
use crate::error::CorrectionError;
use crate::orchestrator::PendingWord;

/// Result of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCompletion {
    pub sequence_id: u64,
    pub result: Result<String, CorrectionError>,
}

pub struct CorrectionWorker {
    request_tx: Option<Sender<PendingWord>>,
    completion_rx: Receiver<WorkerCompletion>,
    thread: Option<JoinHandle<()>>,
    name: String,
}

impl CorrectionWorker {
    /// Start the worker thread. The thread exits once the worker is dropped.
    pub fn spawn(corrector: Box<dyn Corrector>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = channel::<PendingWord>();
        let (completion_tx, completion_rx) = channel();
        let name = corrector.name().to_string();

        let thread = thread::Builder::new()
            .name("libtypo-corrector".into())
            .spawn(move || run(corrector, request_rx, completion_tx))?;

        Ok(Self {
            request_tx: Some(request_tx),
            completion_rx,
            thread: Some(thread),
            name,
        })
    }

    /// Queue `word` for correction. Never blocks.
    pub fn dispatch(&self, word: PendingWord) -> Result<(), CorrectionError> {
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| CorrectionError::Unavailable("worker stopped".into()))?;
        tx.send(word)
            .map_err(|_| CorrectionError::Unavailable("worker thread exited".into()))
    }

    /// Next finished request, if any.
    pub fn try_recv(&self) -> Option<WorkerCompletion> {
        match self.completion_rx.try_recv() {
            Ok(done) => Some(done),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Name of the corrector this worker runs.
    pub fn corrector_name(&self) -> &str {
        &self.name
    }
}

impl Drop for CorrectionWorker {
    fn drop(&mut self) {
        // closing the request channel ends the loop after the current request
        self.request_tx.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("correction worker thread panicked");
            }
        }
    }
}

fn run(
    mut corrector: Box<dyn Corrector>,
    requests: Receiver<PendingWord>,
    completions: Sender<WorkerCompletion>,
) {
    while let Ok(word) = requests.recv() {
        debug!(
            corrector = corrector.name(),
            word = %word.text,
            sequence_id = word.sequence_id,
            "worker: correcting"
        );
        let result = corrector.correct(&word.text, word.context.as_deref());
        let done = WorkerCompletion {
            sequence_id: word.sequence_id,
            result,
        };
        if completions.send(done).is_err() {
            break;
        }
    }
    debug!("worker: request channel closed");
}
