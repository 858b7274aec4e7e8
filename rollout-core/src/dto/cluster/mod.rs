//! Cluster module DTOs

use serde::{Deserialize, Serialize};

use crate::domain::cluster::{Deployment, ServerGroup};
use crate::domain::image::Image;

/// Input of `cluster.namespaces`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacesRequest {
    pub cluster: String,
}

/// Input of `cluster.deployments`, `cluster.pods` and `cluster.scalers`
///
/// Same shape as [`ServerGroup`]; kept separate so the wire contract does not
/// move when the domain type grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequest {
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl GroupRequest {
    pub fn new(cluster: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace,
        }
    }
}

impl From<GroupRequest> for ServerGroup {
    fn from(req: GroupRequest) -> Self {
        ServerGroup::new(req.cluster, req.namespace)
    }
}

impl From<&ServerGroup> for GroupRequest {
    fn from(group: &ServerGroup) -> Self {
        GroupRequest::new(group.cluster.clone(), group.namespace.clone())
    }
}

/// Input of `cluster.updateDeployment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDeploymentRequest {
    pub deployment: Deployment,
    pub image: Image,
    pub group: ServerGroup,
}
