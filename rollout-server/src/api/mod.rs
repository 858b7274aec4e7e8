//! API Module
//!
//! HTTP API layer of a rollout process.
//! Each submodule handles endpoints for a specific concern.

pub mod dispatch;
pub mod error;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use rollout_core::LayeredDispatcher;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state of the API handlers
#[derive(Clone)]
pub struct AppState {
    /// Local procedures, plus the upstream on layers that have one
    pub dispatcher: Arc<LayeredDispatcher>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Dispatch endpoints
        .route("/api/procedures", get(dispatch::list_procedures))
        .route("/api/dispatch/{module}/{procedure}", post(dispatch::dispatch))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_client::RemoteDispatcher;
    use rollout_core::procedures::{cluster, images};
    use rollout_core::{DispatchError, Dispatcher, Layer, LocalDispatcher};

    async fn serve(table: LocalDispatcher) -> String {
        let app = create_router(AppState {
            dispatcher: Arc::new(LayeredDispatcher::new(Layer::Worker, table)),
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn table() -> LocalDispatcher {
        let mut table = LocalDispatcher::new();
        table.register(&cluster::CLUSTERS, |_: ()| async {
            Ok(vec!["cluster1".to_string(), "cluster2".to_string()])
        });
        table.register(&cluster::NAMESPACES, |req: rollout_core::dto::cluster::NamespacesRequest| async move {
            if req.cluster == "broken" {
                return Err(DispatchError::handler("cluster unreachable"));
            }
            Ok(vec![format!("{}-ns", req.cluster)])
        });
        table
    }

    #[tokio::test]
    async fn test_remote_dispatch_reaches_local_table() {
        let base_url = serve(table()).await;
        let remote: Arc<dyn Dispatcher> = Arc::new(RemoteDispatcher::new(base_url));

        let clusters = remote.call(&cluster::CLUSTERS, &()).await.unwrap();
        assert_eq!(clusters, vec!["cluster1", "cluster2"]);

        let request = rollout_core::dto::cluster::NamespacesRequest {
            cluster: "cluster1".to_string(),
        };
        let namespaces = remote.call(&cluster::NAMESPACES, &request).await.unwrap();
        assert_eq!(namespaces, vec!["cluster1-ns"]);
    }

    #[tokio::test]
    async fn test_remote_errors_keep_their_kind() {
        let base_url = serve(table()).await;
        let remote: Arc<dyn Dispatcher> = Arc::new(RemoteDispatcher::new(base_url));

        let unknown = remote.call(&images::IMAGES, &()).await.unwrap_err();
        assert!(unknown.is_unknown_procedure());

        let bad_input = remote
            .dispatch("cluster", "namespaces", serde_json::json!({ "name": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(bad_input, DispatchError::InvalidInput { .. }));

        let request = rollout_core::dto::cluster::NamespacesRequest {
            cluster: "broken".to_string(),
        };
        let failed = remote.call(&cluster::NAMESPACES, &request).await.unwrap_err();
        assert!(
            matches!(failed, DispatchError::Remote { status: 500, ref message } if message.contains("cluster unreachable"))
        );
    }

    #[tokio::test]
    async fn test_health_and_procedures() {
        let base_url = serve(table()).await;
        let remote = RemoteDispatcher::new(base_url);

        remote.health().await.unwrap();
        assert_eq!(
            remote.procedures().await.unwrap(),
            vec!["cluster.clusters".to_string(), "cluster.namespaces".to_string()]
        );
    }
}
