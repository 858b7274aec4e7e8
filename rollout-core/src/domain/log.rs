//! Log domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A log entry written while walking a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub pipeline: String,
    pub message: String,
}

impl LogEntry {
    /// Creates an entry stamped with the current time
    pub fn new(level: LogLevel, pipeline: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            pipeline: pipeline.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
