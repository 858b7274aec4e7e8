//! Cron scheduling snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observable scheduling state of one pipeline timer
///
/// A computed snapshot; mutating it has no effect on the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobDescriptor {
    pub name: String,
    pub is_started: bool,
    pub is_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    pub next_runs: Vec<DateTime<Utc>>,
}
