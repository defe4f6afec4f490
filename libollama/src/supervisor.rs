//! Inference service supervisor.
//!
//! Before any correction request is sent the service must answer a liveness
//! probe. [`Supervisor::ensure_ready`] probes once; if nothing answers it
//! starts the service and polls at a fixed interval for a bounded number of
//! attempts. The supervisor only ever kills a process it started itself.
//!
//! State machine:
//!
//! ```text
//! Unknown -> Probing -> Ready                       (already running)
//!                    -> Starting -> Ready           (spawned, answered)
//!                               -> Failed           (attempts exhausted)
//! ```
//!
//! Startup can be cut short from another thread through the flag returned by
//! [`Supervisor::abort_handle`]. It is checked before the spawn and around
//! every poll, so a shutdown never waits for the whole polling window.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OllamaConfig;
use crate::probe::{HttpProbe, LivenessProbe};
use crate::process::{CommandLauncher, ProcessLauncher, ServiceProcess};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unknown,
    Probing,
    Starting,
    Ready,
    Failed,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("inference service did not become ready after {attempts} attempts")]
    Unavailable { attempts: u32 },

    #[error("failed to start inference service: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to stop inference service: {0}")]
    Kill(#[source] io::Error),

    #[error("inference service probe failed: {0}")]
    Http(String),

    #[error("inference service startup aborted")]
    Aborted,
}

impl ServiceError {
    /// Short message suitable for a startup dialog.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unavailable { .. } => "Ollama failed to start".to_string(),
            Self::Spawn(_) => "Could not run the Ollama server. Is it installed?".to_string(),
            Self::Kill(_) => "Could not stop the Ollama server".to_string(),
            Self::Http(_) => "Ollama is not responding".to_string(),
            Self::Aborted => "Startup cancelled".to_string(),
        }
    }
}

/// Waits between probes. A trait so tests can run without real delays.
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct Supervisor {
    probe: Box<dyn LivenessProbe>,
    launcher: Box<dyn ProcessLauncher>,
    sleeper: Box<dyn Sleeper>,
    poll_interval: Duration,
    max_attempts: u32,
    state: ServiceState,
    child: Option<Box<dyn ServiceProcess>>,
    abort: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(
        probe: Box<dyn LivenessProbe>,
        launcher: Box<dyn ProcessLauncher>,
        sleeper: Box<dyn Sleeper>,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            probe,
            launcher,
            sleeper,
            poll_interval,
            max_attempts,
            state: ServiceState::Unknown,
            child: None,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// HTTP probe against `config.host`, `config.serve_command` launcher,
    /// real sleeps.
    pub fn from_config(config: &OllamaConfig) -> Result<Self, ServiceError> {
        let probe = HttpProbe::new(&config.host, config.probe_timeout())?;
        Ok(Self::new(
            Box::new(probe),
            Box::new(CommandLauncher::new(config.serve_command.clone())),
            Box::new(ThreadSleeper),
            config.poll_interval(),
            config.max_poll_attempts,
        ))
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Flag that stops a running [`Supervisor::ensure_ready`] at its next
    /// check. Once set, startup keeps failing with [`ServiceError::Aborted`].
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    fn check_abort(&mut self) -> Result<(), ServiceError> {
        if self.abort.load(Ordering::SeqCst) {
            info!("inference service startup aborted");
            self.state = ServiceState::Failed;
            return Err(ServiceError::Aborted);
        }
        Ok(())
    }

    /// True when a process started by this supervisor is being tracked.
    pub fn owns_process(&self) -> bool {
        self.child.is_some()
    }

    /// Return once the service answers the liveness probe.
    ///
    /// Never starts a second process: while one is owned this only polls.
    pub fn ensure_ready(&mut self) -> Result<(), ServiceError> {
        if self.state == ServiceState::Ready {
            return Ok(());
        }

        if self.child.is_none() {
            self.state = ServiceState::Probing;
            match self.probe.probe() {
                Ok(()) => {
                    info!("inference service already running");
                    self.state = ServiceState::Ready;
                    return Ok(());
                }
                Err(err) => debug!(error = %err, "inference service not running"),
            }

            self.check_abort()?;
            self.state = ServiceState::Starting;
            let child = match self.launcher.launch() {
                Ok(child) => child,
                Err(err) => {
                    self.state = ServiceState::Failed;
                    return Err(ServiceError::Spawn(err));
                }
            };
            info!(pid = child.id(), "inference service started");
            self.child = Some(child);
        } else {
            self.state = ServiceState::Starting;
        }

        self.poll_until_ready()
    }

    fn poll_until_ready(&mut self) -> Result<(), ServiceError> {
        for attempt in 1..=self.max_attempts {
            self.check_abort()?;
            self.sleeper.sleep(self.poll_interval);
            self.check_abort()?;
            match self.probe.probe() {
                Ok(()) => {
                    info!(attempt, "inference service ready");
                    self.state = ServiceState::Ready;
                    return Ok(());
                }
                Err(err) => debug!(attempt, error = %err, "inference service not ready yet"),
            }

            if let Some(child) = self.child.as_mut() {
                if child.has_exited().unwrap_or(false) {
                    warn!(attempt, "inference service exited during startup");
                    self.child = None;
                    self.state = ServiceState::Failed;
                    return Err(ServiceError::Unavailable { attempts: attempt });
                }
            }
        }

        warn!(attempts = self.max_attempts, "inference service failed to start");
        self.state = ServiceState::Failed;
        Err(ServiceError::Unavailable {
            attempts: self.max_attempts,
        })
    }

    /// Kill the owned process tree, if any. Returns whether anything was
    /// killed. Safe to call any number of times.
    pub fn shutdown(&mut self) -> Result<bool, ServiceError> {
        let Some(mut child) = self.child.take() else {
            return Ok(false);
        };
        let pid = child.id();
        self.state = ServiceState::Unknown;
        child.terminate().map_err(ServiceError::Kill)?;
        info!(pid, "inference service stopped");
        Ok(true)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "teardown on drop failed");
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state)
            .field("child", &self.child.as_ref().map(|c| c.id()))
            .field("poll_interval", &self.poll_interval)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
