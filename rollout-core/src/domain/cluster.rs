//! Cluster domain types
//!
//! Workloads as reported by the cluster backend and the (cluster, namespace)
//! address used to target them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::image::Image;

/// A running workload instance
///
/// Names are unique within one (cluster, namespace) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub image: Image,
}

/// Addressing unit for cluster operations
///
/// A missing namespace addresses the cluster-wide/default scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerGroup {
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ServerGroup {
    pub fn new(cluster: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace,
        }
    }

    /// Addresses the default scope of a cluster
    pub fn cluster(cluster: impl Into<String>) -> Self {
        Self::new(cluster, None)
    }
}

impl fmt::Display for ServerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", self.cluster, namespace),
            None => write!(f, "{}", self.cluster),
        }
    }
}

/// A pod as reported by the cluster backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default)]
    pub restarts: u32,
}

/// A horizontal scaler and its replica bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaler {
    pub name: String,
    pub replicas: Replicas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replicas {
    pub current: u32,
    pub minimum: u32,
    pub maximum: u32,
}
