//! Jobs module DTOs

use serde::{Deserialize, Serialize};

/// Input of `jobs.plan`, `jobs.run` and `jobs.schedules`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub pipeline: String,
}

impl PipelineRequest {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
        }
    }
}
