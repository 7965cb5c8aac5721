//! Batch progress events.
//!
//! The driver reports through a [`Reporter`] instead of printing, so the CLI
//! decides how lines look and tests can assert on what happened.

use std::path::PathBuf;
use std::sync::Mutex;

/// Something that happened during a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchEvent {
    /// Enumeration finished; `count` tasks are about to be dispatched.
    Discovered { count: usize },
    /// A task started rendering.
    Started { input: PathBuf, output: PathBuf },
    /// A task wrote its output.
    Succeeded { input: PathBuf, output: PathBuf },
    /// A task failed. `message` is the underlying error text.
    Failed { input: PathBuf, message: String },
}

/// Receives batch events as they happen.
///
/// Called from every render task, so events of different files may interleave.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &BatchEvent);
}

/// Reporter that drops every event.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &BatchEvent) {}
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<BatchEvent>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<BatchEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &BatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
