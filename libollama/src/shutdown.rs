//! Teardown on quit and on termination signals.
//!
//! Normal quit and SIGINT/SIGTERM both go through [`ShutdownGuard::trigger`],
//! which runs the supervisor teardown exactly once no matter how many times
//! or from how many threads it is called. The supervisor's abort flag is
//! raised before its lock is taken, so a trigger during startup polling
//! only waits for the current attempt.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::supervisor::Supervisor;

pub type SharedSupervisor = Arc<Mutex<Supervisor>>;

#[derive(Debug, Clone)]
pub struct ShutdownGuard {
    supervisor: SharedSupervisor,
    abort: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
}

impl ShutdownGuard {
    pub fn new(supervisor: SharedSupervisor) -> Self {
        let abort = match supervisor.lock() {
            Ok(guard) => guard.abort_handle(),
            Err(poisoned) => poisoned.into_inner().abort_handle(),
        };
        Self {
            supervisor,
            abort,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run teardown. Returns false when it already ran.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!(reason, "shutdown already done");
            return false;
        }
        info!(reason, "shutting down");
        self.abort.store(true, Ordering::SeqCst);

        let mut supervisor = match self.supervisor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match supervisor.shutdown() {
            Ok(true) => info!("inference service terminated"),
            Ok(false) => debug!("no owned inference service to terminate"),
            Err(err) => warn!(error = %err, "inference service teardown failed"),
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Resolve on the first SIGINT or SIGTERM (Ctrl-C elsewhere) and name it.
pub async fn wait_for_termination() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                Ok("SIGINT")
            }
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Exit status conventionally used after being killed by `signal`.
pub fn signal_exit_code(signal: &str) -> i32 {
    match signal {
        "SIGTERM" => 143,
        _ => 130,
    }
}

/// Listen for termination signals on a dedicated thread. On the first one,
/// `guard` is triggered and then `after` runs with the signal name.
pub fn spawn_signal_listener<F>(guard: ShutdownGuard, after: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(&'static str) + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("libollama-signals".into())
        .spawn(move || match runtime.block_on(wait_for_termination()) {
            Ok(signal) => {
                guard.trigger(signal);
                after(signal);
            }
            Err(err) => warn!(error = %err, "could not install signal handlers"),
        })
}
