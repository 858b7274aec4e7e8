//! Engine error types

use rollout_core::DispatchError;
use rollout_core::domain::PipelineValidationError;
use thiserror::Error;

use crate::scheduler::CronError;

/// Failure of a single pipeline step
///
/// Recovered by following the step's `onFailure` edge when one exists.
#[derive(Debug, Error)]
pub enum StepError {
    /// A parameter the step type requires is absent
    #[error("step '{step}' is missing required parameter '{parameter}'")]
    MissingParameter { step: String, parameter: &'static str },

    /// A dispatcher call made by the step failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The readiness hook did not answer with success
    #[error("probe '{hook}' failed: {reason}")]
    ProbeFailed { hook: String, reason: String },

    /// The run took more steps than allowed
    #[error("step budget of {max_steps} exhausted")]
    BudgetExhausted { max_steps: usize },

    /// At least one deployment update of an apply failed
    #[error("{failed} of {total} deployment updates failed while applying pipeline '{pipeline}'")]
    ApplyFailed {
        pipeline: String,
        failed: usize,
        total: usize,
    },
}

impl StepError {
    pub fn missing(step: &str, parameter: &'static str) -> Self {
        Self::MissingParameter {
            step: step.to_string(),
            parameter,
        }
    }
}

/// Errors raised while building the jobs repository
#[derive(Debug, Error)]
pub enum JobsError {
    #[error(transparent)]
    InvalidPipeline(#[from] PipelineValidationError),

    #[error("pipeline '{0}' is registered more than once")]
    DuplicatePipeline(String),

    #[error(transparent)]
    Cron(#[from] CronError),
}
