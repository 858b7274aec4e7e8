//! `planClusterDeployment`: copy images from one cluster to another

use rollout_core::Dispatcher;
use rollout_core::domain::{DeploymentPlan, ServerGroup, StepDescription};
use rollout_core::dto::images::ImageRequest;
use rollout_core::procedures::images;

use super::{copy_images, deployments, scopes};
use crate::error::StepError;

/// Aligns the pipeline's cluster with the step's source cluster
///
/// Namespaces are enumerated on the target (pipeline) cluster and narrowed
/// by the filter. In each scope, target deployments are matched by name
/// against the source cluster's deployments of the same namespace. With a
/// `tag`, the source image name is resolved at that tag instead of copied.
pub async fn plan_cluster_deployment(
    dispatcher: &dyn Dispatcher,
    step: &StepDescription,
    default_cluster: Option<&str>,
) -> Result<Vec<DeploymentPlan>, StepError> {
    let source_cluster = step
        .cluster
        .as_deref()
        .ok_or_else(|| StepError::missing(&step.name, "cluster"))?;
    let target_cluster =
        default_cluster.ok_or_else(|| StepError::missing(&step.name, "pipeline cluster"))?;
    let filter = step.filter();

    let mut plans = Vec::new();
    for group in scopes(dispatcher, target_cluster, &filter).await? {
        let targets = deployments(dispatcher, &group, &filter).await?;
        if targets.is_empty() {
            continue;
        }

        let source_group = ServerGroup::new(source_cluster, group.namespace.clone());
        let mut sources = deployments(dispatcher, &source_group, &filter).await?;

        if let Some(tag) = &step.tag {
            for source in sources.iter_mut() {
                let request = ImageRequest {
                    name: source.image.name.clone(),
                    tag: tag.clone(),
                };
                source.image = dispatcher.call(&images::IMAGE, &request).await?;
            }
        }

        plans.extend(copy_images(targets, &sources, &group));
    }

    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::fixtures;
    use rollout_core::LocalDispatcher;
    use rollout_core::domain::{StepFilter, StepType};
    use std::sync::Arc;

    fn dispatcher() -> Arc<dyn Dispatcher> {
        let mut table = LocalDispatcher::new();
        fixtures::register_read_modules(&mut table);
        Arc::new(table)
    }

    fn step(filter: Option<StepFilter>) -> StepDescription {
        let mut step = StepDescription::new("plan", StepType::PlanClusterDeployment);
        step.cluster = Some("cluster1".to_string());
        step.filter = filter;
        step
    }

    #[tokio::test]
    async fn test_plans_filtered_namespace_and_deployment() {
        let dispatcher = dispatcher();
        let filter = StepFilter {
            namespaces: Some(vec!["namespace1".to_string()]),
            deployments: Some(vec!["deployment1".to_string()]),
        };

        let plans = plan_cluster_deployment(dispatcher.as_ref(), &step(Some(filter)), Some("cluster2"))
            .await
            .unwrap();

        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.group, ServerGroup::new("cluster2", Some("namespace1".to_string())));
        assert_eq!(plan.deployment.name, "deployment1");
        assert_eq!(plan.deployment.image.url.as_deref(), Some("imageUrl:tag1:digest2"));
        assert_eq!(plan.image.url.as_deref(), Some("imageUrl:tag1:digest1"));
    }

    #[tokio::test]
    async fn test_without_filter_plans_every_namespace() {
        let dispatcher = dispatcher();
        let plans = plan_cluster_deployment(dispatcher.as_ref(), &step(None), Some("cluster2"))
            .await
            .unwrap();

        let planned: Vec<(String, String)> = plans
            .iter()
            .map(|plan| (plan.group.to_string(), plan.deployment.name.clone()))
            .collect();
        assert_eq!(
            planned,
            vec![
                ("cluster2/namespace1".to_string(), "deployment1".to_string()),
                ("cluster2/namespace1".to_string(), "deployment2".to_string()),
                ("cluster2/namespace3".to_string(), "deployment1".to_string()),
                ("cluster2/namespace3".to_string(), "deployment2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_filter_matching_nothing_is_empty() {
        let dispatcher = dispatcher();
        let filter = StepFilter {
            namespaces: Some(vec!["nowhere".to_string()]),
            deployments: None,
        };

        let plans = plan_cluster_deployment(dispatcher.as_ref(), &step(Some(filter)), Some("cluster2"))
            .await
            .unwrap();
        assert!(plans.is_empty());
    }

    #[tokio::test]
    async fn test_tag_resolves_source_image() {
        let dispatcher = dispatcher();
        let mut step = step(Some(StepFilter {
            namespaces: Some(vec!["namespace1".to_string()]),
            deployments: Some(vec!["deployment2".to_string()]),
        }));
        step.tag = Some("stable".to_string());

        let plans = plan_cluster_deployment(dispatcher.as_ref(), &step, Some("cluster2"))
            .await
            .unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].image.url.as_deref(), Some("image2:stable:otherDigest"));
    }

    #[tokio::test]
    async fn test_requires_both_clusters() {
        let dispatcher = dispatcher();
        let err = plan_cluster_deployment(dispatcher.as_ref(), &step(None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::MissingParameter { .. }));
    }
}
