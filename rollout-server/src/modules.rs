//! Module registration
//!
//! Binds providers and the jobs repository to the procedure catalogue in a
//! local handler table. Which modules a process registers depends on its
//! layer.

use rollout_core::LocalDispatcher;
use rollout_core::dispatch::DispatchError;
use rollout_core::domain::{Event, ServerGroup};
use rollout_core::dto::cluster::{GroupRequest, NamespacesRequest, UpdateDeploymentRequest};
use rollout_core::dto::images::{ImageRequest, VersionsRequest};
use rollout_core::dto::jobs::PipelineRequest;
use rollout_core::procedures::{cluster, events, images, jobs};
use rollout_engine::JobsRepository;
use std::sync::Arc;

use crate::service::{ClusterProvider, EventSink, ImageProvider};

/// Registers the `cluster` module
pub fn register_cluster(table: &mut LocalDispatcher, provider: Arc<dyn ClusterProvider>) {
    let p = Arc::clone(&provider);
    table.register(&cluster::CLUSTERS, move |_: ()| {
        let p = Arc::clone(&p);
        async move { p.clusters().await.map_err(DispatchError::handler) }
    });

    let p = Arc::clone(&provider);
    table.register(&cluster::NAMESPACES, move |req: NamespacesRequest| {
        let p = Arc::clone(&p);
        async move { p.namespaces(&req.cluster).await.map_err(DispatchError::handler) }
    });

    let p = Arc::clone(&provider);
    table.register(&cluster::DEPLOYMENTS, move |req: GroupRequest| {
        let p = Arc::clone(&p);
        async move {
            let group = ServerGroup::from(req);
            p.deployments(&group).await.map_err(DispatchError::handler)
        }
    });

    let p = Arc::clone(&provider);
    table.register(&cluster::PODS, move |req: GroupRequest| {
        let p = Arc::clone(&p);
        async move {
            let group = ServerGroup::from(req);
            p.pods(&group).await.map_err(DispatchError::handler)
        }
    });

    let p = Arc::clone(&provider);
    table.register(&cluster::SCALERS, move |req: GroupRequest| {
        let p = Arc::clone(&p);
        async move {
            let group = ServerGroup::from(req);
            p.scalers(&group).await.map_err(DispatchError::handler)
        }
    });

    let p = provider;
    table.register(&cluster::UPDATE_DEPLOYMENT, move |req: UpdateDeploymentRequest| {
        let p = Arc::clone(&p);
        async move {
            p.update_deployment(&req.deployment, &req.image, &req.group)
                .await
                .map_err(DispatchError::handler)
        }
    });
}

/// Registers the `images` module
pub fn register_images(table: &mut LocalDispatcher, provider: Arc<dyn ImageProvider>) {
    let p = Arc::clone(&provider);
    table.register(&images::IMAGES, move |_: ()| {
        let p = Arc::clone(&p);
        async move { p.images().await.map_err(DispatchError::handler) }
    });

    let p = Arc::clone(&provider);
    table.register(&images::IMAGE, move |req: ImageRequest| {
        let p = Arc::clone(&p);
        async move { p.image(&req.name, &req.tag).await.map_err(DispatchError::handler) }
    });

    let p = provider;
    table.register(&images::VERSIONS, move |req: VersionsRequest| {
        let p = Arc::clone(&p);
        async move { p.versions(&req.name).await.map_err(DispatchError::handler) }
    });
}

/// Registers the `events` module
pub fn register_events(table: &mut LocalDispatcher, sink: Arc<dyn EventSink>) {
    table.register(&events::LOG, move |event: Event| {
        let sink = Arc::clone(&sink);
        async move { sink.log(&event).await.map_err(DispatchError::handler) }
    });
}

/// Registers the `jobs` module
pub fn register_jobs(table: &mut LocalDispatcher, repo: Arc<dyn JobsRepository>) {
    let r = Arc::clone(&repo);
    table.register(&jobs::PIPELINES, move |_: ()| {
        let r = Arc::clone(&r);
        async move { Ok(r.list()) }
    });

    let r = Arc::clone(&repo);
    table.register(&jobs::PLAN, move |req: PipelineRequest| {
        let r = Arc::clone(&r);
        async move { r.plan(&req.pipeline).await.map_err(DispatchError::handler) }
    });

    let r = Arc::clone(&repo);
    table.register(&jobs::RUN, move |req: PipelineRequest| {
        let r = Arc::clone(&r);
        async move { Ok(r.run(&req.pipeline).await) }
    });

    let r = Arc::clone(&repo);
    table.register(&jobs::SCHEDULES, move |req: PipelineRequest| {
        let r = Arc::clone(&r);
        async move { Ok(r.schedules(&req.pipeline)) }
    });

    let r = repo;
    table.register(&jobs::CRONS, move |_: ()| {
        let r = Arc::clone(&r);
        async move { Ok(r.crons()) }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InventoryClusterProvider;
    use rollout_core::Dispatcher;
    use rollout_core::domain::{Deployment, Image};

    const INVENTORY: &str = r#"
clusters:
  - name: cluster1
    namespaces:
      - name: namespace1
        deployments:
          - name: deployment1
            image: { name: image1, tag: tag1 }
"#;

    fn dispatcher() -> Arc<dyn Dispatcher> {
        let mut table = LocalDispatcher::new();
        let provider = InventoryClusterProvider::from_yaml(INVENTORY).unwrap();
        register_cluster(&mut table, Arc::new(provider));
        Arc::new(table)
    }

    #[tokio::test]
    async fn test_cluster_module_round_trip() {
        let dispatcher = dispatcher();

        let clusters = dispatcher.call(&cluster::CLUSTERS, &()).await.unwrap();
        assert_eq!(clusters, vec!["cluster1"]);

        let group = ServerGroup::new("cluster1", Some("namespace1".to_string()));
        let request = UpdateDeploymentRequest {
            deployment: Deployment {
                name: "deployment1".to_string(),
                image: Image::new("image1").with_tag("tag1"),
            },
            image: Image::new("image1").with_tag("tag2"),
            group: group.clone(),
        };
        let updated = dispatcher
            .call(&cluster::UPDATE_DEPLOYMENT, &request)
            .await
            .unwrap();
        assert_eq!(updated[0].image.tag.as_deref(), Some("tag2"));

        let deployments = dispatcher
            .call(&cluster::DEPLOYMENTS, &GroupRequest::from(&group))
            .await
            .unwrap();
        assert_eq!(deployments[0].image.tag.as_deref(), Some("tag2"));
    }

    #[tokio::test]
    async fn test_provider_errors_become_handler_errors() {
        let dispatcher = dispatcher();
        let request = UpdateDeploymentRequest {
            deployment: Deployment {
                name: "ghost".to_string(),
                image: Image::new("image1"),
            },
            image: Image::new("image1").with_tag("tag2"),
            group: ServerGroup::cluster("cluster1"),
        };

        let err = dispatcher
            .call(&cluster::UPDATE_DEPLOYMENT, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler(ref message) if message.contains("ghost")));
    }
}
