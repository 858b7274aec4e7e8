//! Run log service
//!
//! The channel through which pipeline runs report progress and failures.
//! Production code forwards to `tracing`; tests and reports can buffer the
//! entries in memory instead.

use rollout_core::domain::log::{LogEntry, LogLevel};
use std::sync::{Arc, Mutex, PoisonError};

/// Sink for per-run log entries
pub trait RunLog: Send + Sync {
    /// Records a log entry
    ///
    /// # Arguments
    /// * `entry` - The log entry to record
    fn record(&self, entry: LogEntry);

    fn info(&self, pipeline: &str, message: String) {
        self.record(LogEntry::new(LogLevel::Info, pipeline, message));
    }

    fn warning(&self, pipeline: &str, message: String) {
        self.record(LogEntry::new(LogLevel::Warning, pipeline, message));
    }

    fn error(&self, pipeline: &str, message: String) {
        self.record(LogEntry::new(LogLevel::Error, pipeline, message));
    }
}

/// Forwards entries to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRunLog;

impl RunLog for TracingRunLog {
    fn record(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Debug => tracing::debug!(pipeline = %entry.pipeline, "{}", entry.message),
            LogLevel::Info => tracing::info!(pipeline = %entry.pipeline, "{}", entry.message),
            LogLevel::Warning => tracing::warn!(pipeline = %entry.pipeline, "{}", entry.message),
            LogLevel::Error => tracing::error!(pipeline = %entry.pipeline, "{}", entry.message),
        }
    }
}

/// In-memory implementation of RunLog
///
/// Uses Arc<Mutex<Vec<LogEntry>>> for thread-safe access across tasks.
#[derive(Clone, Default)]
pub struct InMemoryRunLog {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemoryRunLog {
    /// Creates a new in-memory run log
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded entry
    pub fn entries(&self) -> Vec<LogEntry> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded entries of the given level
    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }

    /// Drains all entries from the buffer
    pub fn drain(&self) -> Vec<LogEntry> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.drain(..).collect()
    }
}

impl RunLog for InMemoryRunLog {
    fn record(&self, entry: LogEntry) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push(entry);
    }
}
