//! Jobs repository
//!
//! Owns the registered pipelines, walks their step graphs to plan and run
//! them, applies plans through the dispatcher and wires scheduled pipelines
//! into the cron registry.

mod repository;

pub use repository::StandardJobsRepository;

use async_trait::async_trait;
use rollout_core::domain::{CronJobDescriptor, JobPlan, PipelineDescription, RunReport};
use std::sync::Arc;

use crate::error::StepError;
use crate::scheduler::{Clock, SystemClock};
use crate::service::{HttpProbe, Probe, RunLog, TracingRunLog};

/// Default step budget of a single run
pub const DEFAULT_MAX_STEPS: usize = 256;

/// Pipeline engine operations
#[async_trait]
pub trait JobsRepository: Send + Sync {
    /// Registered pipelines in registration order
    fn list(&self) -> Vec<PipelineDescription>;

    /// Scheduling state of every scheduled pipeline
    fn crons(&self) -> Vec<CronJobDescriptor>;

    /// Scheduling state of one pipeline, if it declares a cron expression
    fn schedules(&self, name: &str) -> Option<CronJobDescriptor>;

    /// Walks a pipeline up to its first apply boundary
    ///
    /// # Returns
    /// `None` for an unknown pipeline, otherwise the accumulated plan
    ///
    /// # Errors
    /// Returns the failure of a step that has no `onFailure` edge
    async fn plan(&self, name: &str) -> Result<Option<JobPlan>, StepError>;

    /// Walks a pipeline, applying accumulated plans at every apply step
    ///
    /// Never fails: step failures end up in the report and the run log.
    async fn run(&self, name: &str) -> RunReport;

    /// Updates every planned deployment and publishes one completion event
    async fn apply(&self, plan: &JobPlan) -> Result<(), StepError>;

    /// Starts every cron timer
    fn start(&self);
}

/// Collaborators of the standard repository
#[derive(Clone)]
pub struct JobsOptions {
    /// Gate for `clusterProbe` steps
    pub probe: Arc<dyn Probe>,
    /// Channel for run progress and failures
    pub run_log: Arc<dyn RunLog>,
    /// Event timestamps
    pub clock: Arc<dyn Clock>,
    /// Steps one run may take before it is cut off
    pub max_steps: usize,
}

impl Default for JobsOptions {
    fn default() -> Self {
        Self {
            probe: Arc::new(HttpProbe::default()),
            run_log: Arc::new(TracingRunLog),
            clock: Arc::new(SystemClock),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}
