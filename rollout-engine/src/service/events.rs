//! Event publisher
//!
//! Builds the completion event of an apply and sends it through the
//! dispatcher's `events.log` procedure.

use chrono::{DateTime, Utc};
use rollout_core::domain::{DeploymentPlan, Event, EventField, JobPlan};
use rollout_core::procedures::events;
use rollout_core::{DispatchError, Dispatcher};
use std::sync::Arc;

/// Separator between the parts of an event field title
const TITLE_SEPARATOR: &str = " ∞ ";

/// Topic picked up by the Slack sink
pub const SLACK_TOPIC: &str = "slack";

/// `<cluster> ∞ <namespace-or-empty> ∞ <deployment>`
pub fn field_title(entry: &DeploymentPlan) -> String {
    [
        entry.group.cluster.as_str(),
        entry.group.namespace.as_deref().unwrap_or_default(),
        entry.deployment.name.as_str(),
    ]
    .join(TITLE_SEPARATOR)
}

/// Builds the event reporting an applied plan
///
/// # Arguments
/// * `plan` - The applied plan
/// * `outcomes` - One entry per plan entry, in plan order; `Err` holds the
///   update failure message
/// * `timestamp` - Event time
pub fn applied_event(
    plan: &JobPlan,
    outcomes: &[Result<(), String>],
    timestamp: DateTime<Utc>,
) -> Event {
    let fields = plan
        .deployments
        .iter()
        .zip(outcomes)
        .map(|(entry, outcome)| EventField {
            title: field_title(entry),
            value: match outcome {
                Ok(()) => format!("updated to {}", entry.image),
                Err(e) => format!("failed to update to {}: {}", entry.image, e),
            },
        })
        .collect();

    Event {
        message: format!("Applied pipeline {}", plan.name),
        description: format!(
            "Applied {} deployments while executing pipeline {}",
            plan.deployments.len(),
            plan.name
        ),
        timestamp,
        topics: vec![SLACK_TOPIC.to_string()],
        fields,
    }
}

/// Sends events through the dispatcher
#[derive(Clone)]
pub struct EventPublisher {
    dispatcher: Arc<dyn Dispatcher>,
}

impl EventPublisher {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Publishes one event via `events.log`
    pub async fn publish(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatcher.call(&events::LOG, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_core::domain::{Deployment, Image, ServerGroup};

    fn entry(namespace: Option<&str>) -> DeploymentPlan {
        DeploymentPlan {
            deployment: Deployment {
                name: "service1".to_string(),
                image: Image::new("image1").with_url("imageUrl:tag1:digest1"),
            },
            image: Image::new("image1").with_url("image:tag:digest"),
            group: ServerGroup::new("cluster1", namespace.map(str::to_string)),
        }
    }

    #[test]
    fn test_field_title_with_and_without_namespace() {
        assert_eq!(field_title(&entry(Some("namespace1"))), "cluster1 ∞ namespace1 ∞ service1");
        assert_eq!(field_title(&entry(None)), "cluster1 ∞  ∞ service1");
    }

    #[test]
    fn test_applied_event_reports_failures_in_plan_order() {
        let plan = JobPlan::new("pipelineName", vec![entry(Some("a")), entry(Some("b"))]);
        let outcomes = vec![Ok(()), Err("backend down".to_string())];
        let event = applied_event(&plan, &outcomes, Utc::now());

        assert_eq!(event.message, "Applied pipeline pipelineName");
        assert_eq!(
            event.description,
            "Applied 2 deployments while executing pipeline pipelineName"
        );
        assert_eq!(event.topics, vec!["slack".to_string()]);
        assert_eq!(event.fields[0].value, "updated to image:tag:digest");
        assert_eq!(
            event.fields[1].value,
            "failed to update to image:tag:digest: backend down"
        );
    }
}
