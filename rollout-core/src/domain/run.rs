//! Pipeline run outcome types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::JobPlan;

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub pipeline: String,
    pub status: RunStatus,
    /// Plans handed to apply, in order
    pub applied: Vec<JobPlan>,
}

impl RunReport {
    /// Report for a pipeline name that is not registered
    pub fn unknown(pipeline: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline: pipeline.into(),
            status: RunStatus::UnknownPipeline,
            applied: Vec::new(),
        }
    }

    /// Number of deployment updates issued during the run
    pub fn deployments_applied(&self) -> usize {
        self.applied.iter().map(|plan| plan.deployments.len()).sum()
    }
}

/// Final state of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum RunStatus {
    /// The walk reached a step with no follow-on edge
    Completed,
    /// A step failed and had no failure edge
    Failed { step: String, error: String },
    /// Nothing was run
    UnknownPipeline,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::Failed { step, error } => write!(f, "Failed at '{}': {}", step, error),
            RunStatus::UnknownPipeline => write!(f, "Unknown pipeline"),
        }
    }
}
