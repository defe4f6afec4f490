//! Transient status indicator.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Checking,
    Suggestion,
    Success(String),
    Error(String),
}

/// Current status plus the instant it falls back to [`Status::Idle`].
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    status: Status,
    reset_at: Option<Instant>,
    reset_after: Duration,
}

impl StatusIndicator {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            status: Status::Idle,
            reset_at: None,
            reset_after,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn checking(&mut self) {
        self.set(Status::Checking, None);
    }

    pub fn suggestion(&mut self) {
        self.set(Status::Suggestion, None);
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.set(Status::Success(message.into()), Some(now + self.reset_after));
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.set(Status::Error(message.into()), Some(now + self.reset_after));
    }

    pub fn idle(&mut self) {
        self.set(Status::Idle, None);
    }

    /// Reset to idle once the deadline passed. Returns true if it changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.reset_at {
            Some(deadline) if now >= deadline => {
                self.idle();
                true
            }
            _ => false,
        }
    }

    /// Text shown next to the indicator.
    pub fn label(&self) -> String {
        match &self.status {
            Status::Idle => "Ready".to_string(),
            Status::Checking => "Checking word".to_string(),
            Status::Suggestion => "Suggestion available".to_string(),
            Status::Success(msg) | Status::Error(msg) => msg.clone(),
        }
    }

    fn set(&mut self, status: Status, reset_at: Option<Instant>) {
        self.status = status;
        self.reset_at = reset_at;
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}
