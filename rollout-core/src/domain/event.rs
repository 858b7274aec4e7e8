//! Event domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification record published through the events module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub message: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Destinations, e.g. "slack"
    pub topics: Vec<String>,
    pub fields: Vec<EventField>,
}

/// Key/value display pair attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventField {
    pub title: String,
    pub value: String,
}
