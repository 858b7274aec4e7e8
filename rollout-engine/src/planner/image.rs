//! `planImageDeployment`: move deployments to the image resolved for a tag

use rollout_core::Dispatcher;
use rollout_core::domain::{DeploymentPlan, StepDescription};
use rollout_core::dto::images::ImageRequest;
use rollout_core::procedures::{cluster, images};

use super::{deployments, scopes};
use crate::error::StepError;

/// Resolves every deployment's image name at the step's `tag`
///
/// Scans every cluster, or only `default_cluster` when the pipeline sets one.
/// An entry is emitted when the resolved image differs from the running one.
pub async fn plan_image_deployment(
    dispatcher: &dyn Dispatcher,
    step: &StepDescription,
    default_cluster: Option<&str>,
) -> Result<Vec<DeploymentPlan>, StepError> {
    let tag = step
        .tag
        .as_deref()
        .ok_or_else(|| StepError::missing(&step.name, "tag"))?;
    let filter = step.filter();

    let clusters = match default_cluster {
        Some(cluster_name) => vec![cluster_name.to_string()],
        None => dispatcher.call(&cluster::CLUSTERS, &()).await?,
    };

    let mut plans = Vec::new();
    for cluster_name in &clusters {
        for group in scopes(dispatcher, cluster_name, &filter).await? {
            for deployment in deployments(dispatcher, &group, &filter).await? {
                let request = ImageRequest {
                    name: deployment.image.name.clone(),
                    tag: tag.to_string(),
                };
                let image = dispatcher.call(&images::IMAGE, &request).await?;

                if !deployment.image.same_reference(&image) {
                    plans.push(DeploymentPlan {
                        deployment,
                        image,
                        group: group.clone(),
                    });
                }
            }
        }
    }

    Ok(plans)
}
