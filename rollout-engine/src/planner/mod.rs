//! Planner
//!
//! Computes the deployment changes contributed by a planning step. Every
//! planner only reads collaborator state through dispatcher calls; nothing
//! is mutated while planning.
//!
//! Entries keep the enumeration order of the cluster module: cluster order,
//! then namespace order, then deployment order.

mod cluster;
mod image;
mod namespace;

pub use cluster::plan_cluster_deployment;
pub use image::plan_image_deployment;
pub use namespace::plan_namespace_deployment;

use rollout_core::Dispatcher;
use rollout_core::domain::{
    Deployment, DeploymentPlan, ServerGroup, StepDescription, StepFilter, StepType,
};
use rollout_core::dto::cluster::{GroupRequest, NamespacesRequest};
use rollout_core::procedures::cluster as cluster_procedures;

use crate::error::StepError;

/// Runs the planner matching the step's type
///
/// Non-planning steps contribute nothing.
///
/// # Arguments
/// * `dispatcher` - Call layer reaching the cluster and images modules
/// * `step` - The planning step
/// * `default_cluster` - The pipeline's default cluster
pub async fn plan_step(
    dispatcher: &dyn Dispatcher,
    step: &StepDescription,
    default_cluster: Option<&str>,
) -> Result<Vec<DeploymentPlan>, StepError> {
    match step.step_type {
        StepType::PlanImageDeployment => plan_image_deployment(dispatcher, step, default_cluster).await,
        StepType::PlanClusterDeployment => {
            plan_cluster_deployment(dispatcher, step, default_cluster).await
        }
        StepType::PlanNamespaceDeployment => {
            plan_namespace_deployment(dispatcher, step, default_cluster).await
        }
        _ => Ok(Vec::new()),
    }
}

/// Server groups of a cluster allowed by the filter
///
/// A cluster without namespaces is a single unnamed scope.
async fn scopes(
    dispatcher: &dyn Dispatcher,
    cluster_name: &str,
    filter: &StepFilter,
) -> Result<Vec<ServerGroup>, StepError> {
    let request = NamespacesRequest {
        cluster: cluster_name.to_string(),
    };
    let namespaces = dispatcher.call(&cluster_procedures::NAMESPACES, &request).await?;

    let groups = if namespaces.is_empty() {
        vec![ServerGroup::cluster(cluster_name)]
    } else {
        namespaces
            .into_iter()
            .map(|namespace| ServerGroup::new(cluster_name, Some(namespace)))
            .collect()
    };

    Ok(groups
        .into_iter()
        .filter(|group| filter.allows_namespace(group.namespace.as_deref()))
        .collect())
}

/// Deployments of a server group allowed by the filter
async fn deployments(
    dispatcher: &dyn Dispatcher,
    group: &ServerGroup,
    filter: &StepFilter,
) -> Result<Vec<Deployment>, StepError> {
    let deployments = dispatcher
        .call(&cluster_procedures::DEPLOYMENTS, &GroupRequest::from(group))
        .await?;

    Ok(deployments
        .into_iter()
        .filter(|deployment| filter.allows_deployment(&deployment.name))
        .collect())
}

/// Plans moving each target deployment to its same-named source's image
fn copy_images(
    targets: Vec<Deployment>,
    sources: &[Deployment],
    group: &ServerGroup,
) -> Vec<DeploymentPlan> {
    targets
        .into_iter()
        .filter_map(|target| {
            let source = sources.iter().find(|source| source.name == target.name)?;
            let plan = DeploymentPlan {
                image: source.image.clone(),
                deployment: target,
                group: group.clone(),
            };
            (!plan.is_noop()).then_some(plan)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-process cluster and images modules shared by planner and jobs tests

    use rollout_core::LocalDispatcher;
    use rollout_core::domain::{Deployment, Image};
    use rollout_core::dto::cluster::{GroupRequest, NamespacesRequest};
    use rollout_core::dto::images::ImageRequest;
    use rollout_core::procedures::{cluster, images};

    fn deployment(name: &str, image: &str, url: &str) -> Deployment {
        Deployment {
            name: name.to_string(),
            image: Image::new(image).with_url(url),
        }
    }

    /// Deployments keyed like `cluster` or `cluster` + `namespace` for cluster2
    pub fn mock_deployments(cluster: &str, namespace: Option<&str>) -> Vec<Deployment> {
        let key = if cluster == "cluster2" {
            format!("{}{}", cluster, namespace.unwrap_or_default())
        } else {
            cluster.to_string()
        };

        match key.as_str() {
            "cluster1" => vec![
                deployment("deployment1", "image1", "imageUrl:tag1:digest1"),
                deployment("deployment2", "image2", "imageUrl:tag2:digest1"),
            ],
            "cluster2namespace1" => vec![
                deployment("deployment1", "image1", "imageUrl:tag1:digest2"),
                deployment("deployment2", "image2", "imageUrl:tag2:digest3"),
            ],
            "cluster2namespace3" => vec![
                deployment("deployment1", "image1", "imageUrl:tag1:digest3"),
                deployment("deployment2", "image2", "imageUrl:tag2:digest5"),
            ],
            "cluster3" => vec![
                deployment("deployment1", "image1", "imageUrl:tag1:digest2"),
                deployment("deployment2", "image2", "imageUrl:tag2:digest4"),
            ],
            _ => Vec::new(),
        }
    }

    pub fn mock_namespaces(cluster: &str) -> Vec<String> {
        match cluster {
            "cluster2" => vec!["namespace1".to_string(), "namespace3".to_string()],
            "cluster3" => vec!["namespace2".to_string()],
            _ => Vec::new(),
        }
    }

    /// Registers read-only cluster and images handlers over the mock data
    pub fn register_read_modules(table: &mut LocalDispatcher) {
        table
            .register(&cluster::CLUSTERS, |_: ()| async move {
                Ok(vec![
                    "cluster1".to_string(),
                    "cluster2".to_string(),
                    "cluster3".to_string(),
                ])
            })
            .register(&cluster::NAMESPACES, |input: NamespacesRequest| async move {
                Ok(mock_namespaces(&input.cluster))
            })
            .register(&cluster::DEPLOYMENTS, |input: GroupRequest| async move {
                Ok(mock_deployments(&input.cluster, input.namespace.as_deref()))
            })
            .register(&images::IMAGE, |input: ImageRequest| async move {
                Ok(Image::new(&input.name)
                    .with_tag(&input.tag)
                    .with_url(format!("{}:{}:otherDigest", input.name, input.tag)))
            });
    }
}
