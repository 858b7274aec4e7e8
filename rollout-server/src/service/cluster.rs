//! Cluster Service
//!
//! The cluster module's backend. `InventoryClusterProvider` keeps cluster
//! state in memory, seeded from a YAML inventory:
//!
//! ```yaml
//! clusters:
//!   - name: production
//!     deployments:            # cluster-wide scope
//!       - name: api
//!         image: { name: api, tag: "1.2.0" }
//!     namespaces:
//!       - name: team-a
//!         deployments: []
//!         pods: []
//!         scalers: []
//! ```

use async_trait::async_trait;
use rollout_core::domain::{Deployment, Image, Pod, Scaler, ServerGroup};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use super::{ProviderError, Result};

/// Cluster backend
///
/// Unknown clusters and namespaces read as empty.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    async fn clusters(&self) -> Result<Vec<String>>;

    async fn namespaces(&self, cluster: &str) -> Result<Vec<String>>;

    async fn deployments(&self, group: &ServerGroup) -> Result<Vec<Deployment>>;

    async fn pods(&self, group: &ServerGroup) -> Result<Vec<Pod>>;

    async fn scalers(&self, group: &ServerGroup) -> Result<Vec<Scaler>>;

    /// Moves a deployment to a new image
    ///
    /// # Returns
    /// The deployments of the group after the update
    async fn update_deployment(
        &self,
        deployment: &Deployment,
        image: &Image,
        group: &ServerGroup,
    ) -> Result<Vec<Deployment>>;
}

// =============================================================================
// Inventory format
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub clusters: Vec<ClusterInventory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workloads {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(default)]
    pub scalers: Vec<Scaler>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInventory {
    pub name: String,
    #[serde(default)]
    pub namespaces: Vec<NamespaceInventory>,
    #[serde(flatten)]
    pub workloads: Workloads,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceInventory {
    pub name: String,
    #[serde(flatten)]
    pub workloads: Workloads,
}

impl Inventory {
    fn workloads(&self, group: &ServerGroup) -> Option<&Workloads> {
        let cluster = self.clusters.iter().find(|c| c.name == group.cluster)?;
        match &group.namespace {
            None => Some(&cluster.workloads),
            Some(namespace) => cluster
                .namespaces
                .iter()
                .find(|n| &n.name == namespace)
                .map(|n| &n.workloads),
        }
    }

    fn workloads_mut(&mut self, group: &ServerGroup) -> Option<&mut Workloads> {
        let cluster = self.clusters.iter_mut().find(|c| c.name == group.cluster)?;
        match &group.namespace {
            None => Some(&mut cluster.workloads),
            Some(namespace) => cluster
                .namespaces
                .iter_mut()
                .find(|n| &n.name == namespace)
                .map(|n| &mut n.workloads),
        }
    }
}

// =============================================================================
// Inventory provider
// =============================================================================

/// In-memory cluster state
pub struct InventoryClusterProvider {
    inventory: RwLock<Inventory>,
}

impl InventoryClusterProvider {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory: RwLock::new(inventory),
        }
    }

    /// Parses an inventory from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let inventory: Inventory =
            serde_yml::from_str(yaml).map_err(|e| ProviderError::Parse(format!("inventory: {}", e)))?;
        Ok(Self::new(inventory))
    }

    /// Loads an inventory file
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn read<T>(&self, f: impl FnOnce(&Inventory) -> T) -> T {
        let inventory = self.inventory.read().unwrap_or_else(PoisonError::into_inner);
        f(&inventory)
    }
}

#[async_trait]
impl ClusterProvider for InventoryClusterProvider {
    async fn clusters(&self) -> Result<Vec<String>> {
        Ok(self.read(|inv| inv.clusters.iter().map(|c| c.name.clone()).collect()))
    }

    async fn namespaces(&self, cluster: &str) -> Result<Vec<String>> {
        Ok(self.read(|inv| {
            inv.clusters
                .iter()
                .find(|c| c.name == cluster)
                .map(|c| c.namespaces.iter().map(|n| n.name.clone()).collect())
                .unwrap_or_default()
        }))
    }

    async fn deployments(&self, group: &ServerGroup) -> Result<Vec<Deployment>> {
        Ok(self.read(|inv| {
            inv.workloads(group)
                .map(|w| w.deployments.clone())
                .unwrap_or_default()
        }))
    }

    async fn pods(&self, group: &ServerGroup) -> Result<Vec<Pod>> {
        Ok(self.read(|inv| inv.workloads(group).map(|w| w.pods.clone()).unwrap_or_default()))
    }

    async fn scalers(&self, group: &ServerGroup) -> Result<Vec<Scaler>> {
        Ok(self.read(|inv| {
            inv.workloads(group)
                .map(|w| w.scalers.clone())
                .unwrap_or_default()
        }))
    }

    async fn update_deployment(
        &self,
        deployment: &Deployment,
        image: &Image,
        group: &ServerGroup,
    ) -> Result<Vec<Deployment>> {
        let mut inventory = self.inventory.write().unwrap_or_else(PoisonError::into_inner);

        let unknown = || ProviderError::UnknownDeployment {
            group: group.to_string(),
            deployment: deployment.name.clone(),
        };

        let workloads = inventory.workloads_mut(group).ok_or_else(unknown)?;
        let target = workloads
            .deployments
            .iter_mut()
            .find(|d| d.name == deployment.name)
            .ok_or_else(unknown)?;

        tracing::info!(
            "Updating deployment {} in {} from {} to {}",
            target.name,
            group,
            target.image,
            image
        );
        target.image = image.clone();

        Ok(workloads.deployments.clone())
    }
}
