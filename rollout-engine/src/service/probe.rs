//! Readiness probe service

use async_trait::async_trait;

use crate::error::StepError;

/// Gate used by `clusterProbe` steps
#[async_trait]
pub trait Probe: Send + Sync {
    /// Checks the readiness hook
    ///
    /// # Arguments
    /// * `hook` - Hook address taken from the step
    ///
    /// # Returns
    /// `Ok(())` when the hook reports ready
    async fn check(&self, hook: &str) -> Result<(), StepError>;
}

/// Probe that issues an HTTP GET and expects a 2xx answer
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, hook: &str) -> Result<(), StepError> {
        let failed = |reason: String| StepError::ProbeFailed {
            hook: hook.to_string(),
            reason,
        };

        let response = self
            .client
            .get(hook)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("status {}", status.as_u16())));
        }

        tracing::debug!("Probe {} answered {}", hook, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    async fn serve() -> String {
        let app = Router::new()
            .route("/ready", get(|| async { StatusCode::OK }))
            .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_ready_hook_passes() {
        let base_url = serve().await;
        let probe = HttpProbe::default();
        assert!(probe.check(&format!("{}/ready", base_url)).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_fails_with_status() {
        let base_url = serve().await;
        let hook = format!("{}/down", base_url);
        let probe = HttpProbe::default();

        let err = probe.check(&hook).await.unwrap_err();
        match err {
            StepError::ProbeFailed { hook: failed, reason } => {
                assert_eq!(failed, hook);
                assert!(reason.contains("status 503"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_hook_fails() {
        let probe = HttpProbe::default();
        let err = probe.check("http://127.0.0.1:1/ready").await.unwrap_err();
        assert!(matches!(err, StepError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_hook_fails() {
        let probe = HttpProbe::default();
        assert!(probe.check("someHook").await.is_err());
    }
}
