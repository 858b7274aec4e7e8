//! Rollout Engine
//!
//! The pipeline execution engine: walks pipeline step graphs, computes and
//! applies deployment plans and drives scheduled pipelines from cron timers.
//! Every cluster, image and event operation goes through a
//! [`rollout_core::Dispatcher`], so the engine runs unchanged next to its
//! collaborators or in front of a remote worker.
//!
//! Layers:
//! - `planner`: per-step deployment diffing
//! - `jobs`: the jobs repository and its step graph interpreter
//! - `scheduler`: cron timers and clocks
//! - `service`: run log, readiness probe and event publishing

pub mod error;
pub mod jobs;
pub mod planner;
pub mod scheduler;
pub mod service;

pub use error::{JobsError, StepError};
pub use jobs::{DEFAULT_MAX_STEPS, JobsOptions, JobsRepository, StandardJobsRepository};
pub use scheduler::{Clock, CronError, CronRegistry, FixedClock, SystemClock};
pub use service::{HttpProbe, InMemoryRunLog, Probe, RunLog, TracingRunLog};
