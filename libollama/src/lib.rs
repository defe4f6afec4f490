//! libollama
//!
//! Ollama backend for `libtypo-core`: the HTTP corrector, the supervisor
//! that makes sure an inference server is running (starting one if needed
//! and killing it on shutdown), and the character recognizer client.
//!
//! Public API:
//! - `OllamaCorrector` - `Corrector` implementation over `/api/generate`
//! - `Supervisor` - Probe, spawn, poll and tear down the service
//! - `ShutdownGuard` - One-shot teardown shared by quit and signal paths
//! - `RecognizerClient` - Drawing and IMU capture to character
//! - `OllamaConfig` - Backend configuration (flattens the core `Config`)

pub mod config;
pub use config::OllamaConfig;

pub mod prompt;
pub use prompt::{build_prompt, clean_response};

pub mod client;
pub use client::{CacheStats, OllamaCorrector};

pub mod probe;
pub use probe::{HttpProbe, LivenessProbe};

pub mod process;
pub use process::{ChildProcess, CommandLauncher, ProcessLauncher, ServiceProcess};

pub mod supervisor;
pub use supervisor::{ServiceError, ServiceState, Sleeper, Supervisor, ThreadSleeper};

pub mod shutdown;
pub use shutdown::{spawn_signal_listener, SharedSupervisor, ShutdownGuard};

pub mod recognizer;
pub use recognizer::{Prediction, RecognizerClient, RecognizerError};

// Re-export core types for convenience
pub use libtypo_core::{
    Config, CorrectionEngine, CorrectionError, Corrector, IdentityCorrector, KeyEvent, KeyResult,
};
