//! Rollout HTTP Client
//!
//! The remote side of the dispatcher: a [`RemoteDispatcher`] forwards every
//! `(module, procedure)` call as JSON to another Rollout process and decodes
//! the answer, so pipeline logic cannot tell it apart from an in-process call.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rollout_client::RemoteDispatcher;
//! use rollout_core::{Dispatcher, procedures::cluster};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher: Arc<dyn Dispatcher> = Arc::new(RemoteDispatcher::new("http://localhost:8080"));
//!
//!     let clusters = dispatcher.call(&cluster::CLUSTERS, &()).await?;
//!     println!("Clusters: {:?}", clusters);
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{ClientError, Result};

use async_trait::async_trait;
use reqwest::Client;
use rollout_core::{DispatchError, Dispatcher};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Dispatcher that proxies calls to a remote Rollout process over HTTP
#[derive(Debug, Clone)]
pub struct RemoteDispatcher {
    /// Base URL of the remote process (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl RemoteDispatcher {
    /// Create a new remote dispatcher
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the remote API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new remote dispatcher with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the remote API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a remote dispatcher whose requests time out after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the remote process
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Endpoints
    // =============================================================================

    /// Invoke a procedure on the remote process
    ///
    /// # Arguments
    /// * `module` - Module name (e.g., "cluster")
    /// * `procedure` - Procedure name (e.g., "deployments")
    /// * `input` - JSON encoded input
    ///
    /// # Returns
    /// The JSON encoded output
    pub async fn invoke(&self, module: &str, procedure: &str, input: &JsonValue) -> Result<JsonValue> {
        let url = format!("{}/api/dispatch/{}/{}", self.base_url, module, procedure);
        tracing::debug!("Dispatching {}.{} to {}", module, procedure, self.base_url);

        let response = self.client.post(&url).json(input).send().await?;

        self.handle_response(response).await
    }

    /// List the procedures hosted by the remote process
    pub async fn procedures(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/procedures", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Check whether the remote process answers its health endpoint
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl Dispatcher for RemoteDispatcher {
    async fn dispatch(
        &self,
        module: &str,
        procedure: &str,
        input: JsonValue,
    ) -> std::result::Result<JsonValue, DispatchError> {
        self.invoke(module, procedure, &input)
            .await
            .map_err(|e| e.into_dispatch_error(module, procedure))
    }
}
