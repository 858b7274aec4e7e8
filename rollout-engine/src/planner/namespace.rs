//! `planNamespaceDeployment`: promote images from one namespace to another

use rollout_core::Dispatcher;
use rollout_core::domain::{DeploymentPlan, ServerGroup, StepDescription, StepFilter};

use super::{copy_images, deployments};
use crate::error::StepError;

/// Moves target-namespace deployments to the image of their source twins
///
/// The source is (`cluster`, `source`) from the step. The target is
/// (pipeline cluster, `target`), falling back to the step's cluster.
pub async fn plan_namespace_deployment(
    dispatcher: &dyn Dispatcher,
    step: &StepDescription,
    default_cluster: Option<&str>,
) -> Result<Vec<DeploymentPlan>, StepError> {
    let source_cluster = step
        .cluster
        .as_deref()
        .ok_or_else(|| StepError::missing(&step.name, "cluster"))?;
    let source = step
        .source
        .clone()
        .ok_or_else(|| StepError::missing(&step.name, "source"))?;
    let target = step
        .target
        .clone()
        .ok_or_else(|| StepError::missing(&step.name, "target"))?;

    // Only the deployment allow-list applies; namespaces are explicit
    let filter = StepFilter {
        namespaces: None,
        deployments: step.filter().deployments,
    };

    let source_group = ServerGroup::new(source_cluster, Some(source));
    let target_group = ServerGroup::new(default_cluster.unwrap_or(source_cluster), Some(target));

    let sources = deployments(dispatcher, &source_group, &filter).await?;
    let targets = deployments(dispatcher, &target_group, &filter).await?;

    Ok(copy_images(targets, &sources, &target_group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::fixtures;
    use rollout_core::LocalDispatcher;
    use rollout_core::domain::StepType;
    use std::sync::Arc;

    fn step(deployments: Option<Vec<&str>>) -> StepDescription {
        let mut step = StepDescription::new("plan", StepType::PlanNamespaceDeployment);
        step.cluster = Some("cluster2".to_string());
        step.source = Some("namespace3".to_string());
        step.target = Some("namespace2".to_string());
        step.filter = deployments.map(|names| StepFilter {
            namespaces: None,
            deployments: Some(names.into_iter().map(str::to_string).collect()),
        });
        step
    }

    fn dispatcher() -> Arc<dyn Dispatcher> {
        let mut table = LocalDispatcher::new();
        fixtures::register_read_modules(&mut table);
        Arc::new(table)
    }

    #[tokio::test]
    async fn test_promotes_filtered_deployment() {
        let dispatcher = dispatcher();
        let plans = plan_namespace_deployment(
            dispatcher.as_ref(),
            &step(Some(vec!["deployment2"])),
            Some("cluster3"),
        )
        .await
        .unwrap();

        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.group, ServerGroup::new("cluster3", Some("namespace2".to_string())));
        assert_eq!(plan.deployment.name, "deployment2");
        assert_eq!(plan.deployment.image.url.as_deref(), Some("imageUrl:tag2:digest4"));
        assert_eq!(plan.image.url.as_deref(), Some("imageUrl:tag2:digest5"));
    }

    #[tokio::test]
    async fn test_without_filter_promotes_every_differing_twin() {
        let dispatcher = dispatcher();
        let plans = plan_namespace_deployment(dispatcher.as_ref(), &step(None), Some("cluster3"))
            .await
            .unwrap();

        let names: Vec<&str> = plans.iter().map(|plan| plan.deployment.name.as_str()).collect();
        assert_eq!(names, vec!["deployment1", "deployment2"]);
    }

    #[tokio::test]
    async fn test_same_namespace_is_a_noop() {
        let dispatcher = dispatcher();
        let mut step = step(None);
        step.target = Some("namespace3".to_string());

        let plans = plan_namespace_deployment(dispatcher.as_ref(), &step, None)
            .await
            .unwrap();
        assert!(plans.is_empty());
    }

    #[tokio::test]
    async fn test_requires_source_and_target() {
        let dispatcher = dispatcher();
        let mut step = step(None);
        step.source = None;

        let err = plan_namespace_deployment(dispatcher.as_ref(), &step, Some("cluster3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StepError::MissingParameter { parameter: "source", .. }
        ));
    }
}
