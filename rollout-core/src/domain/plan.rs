//! Deployment plan types

use serde::{Deserialize, Serialize};

use crate::domain::cluster::{Deployment, ServerGroup};
use crate::domain::image::Image;

/// One proposed change: move `deployment` to `image` within `group`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Deployment state before the change
    pub deployment: Deployment,
    /// Target image
    pub image: Image,
    /// Target server group
    pub group: ServerGroup,
}

impl DeploymentPlan {
    /// Returns true when applying this entry would not change anything
    pub fn is_noop(&self) -> bool {
        self.deployment.image.same_reference(&self.image)
    }
}

/// Full output of planning one pipeline run
///
/// Entries keep the enumeration order of the cluster backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPlan {
    /// Pipeline name
    pub name: String,
    pub deployments: Vec<DeploymentPlan>,
}

impl JobPlan {
    pub fn new(name: impl Into<String>, deployments: Vec<DeploymentPlan>) -> Self {
        Self {
            name: name.into(),
            deployments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }
}
