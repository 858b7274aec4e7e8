//! Scheduler layer for the engine
//!
//! This layer owns the cron timers that trigger pipeline runs. Timers are
//! registered stopped, started as a group or one by one, and observed only
//! through `CronJobDescriptor` snapshots.

pub mod clock;
pub mod expression;
pub mod registry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use registry::{CronRegistry, DEFAULT_NEXT_RUNS};

use thiserror::Error;

/// Errors raised by the cron registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("cron job '{0}' is already registered")]
    DuplicateJob(String),

    #[error("cron job '{0}' is not registered")]
    UnknownJob(String),
}
