//! Error types for the Rollout client

use rollout_core::DispatchError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a remote Rollout process
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and response body
    ///
    /// Bodies of the form `{"error": "..."}` are unwrapped to their message.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or(body);

        Self::ApiError { status, message }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Translates the error into the dispatcher taxonomy
    ///
    /// # Arguments
    /// * `module` - Module of the failed call
    /// * `procedure` - Procedure of the failed call
    pub fn into_dispatch_error(self, module: &str, procedure: &str) -> DispatchError {
        match self {
            ClientError::RequestFailed(e) => DispatchError::Transport(e.to_string()),
            ClientError::ApiError { status: 404, .. } => DispatchError::unknown(module, procedure),
            ClientError::ApiError { status: 400, message } => DispatchError::InvalidInput {
                procedure: format!("{}.{}", module, procedure),
                message,
            },
            ClientError::ApiError { status, message } => DispatchError::Remote { status, message },
            ClientError::ParseError(message) => DispatchError::InvalidOutput {
                procedure: format!("{}.{}", module, procedure),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_unwraps_json_body() {
        let err = ClientError::api_error(500, r#"{"error":"Handler failed: boom"}"#);
        assert_eq!(err.to_string(), "API error (status 500): Handler failed: boom");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = ClientError::api_error(502, "Bad Gateway");
        assert!(matches!(err, ClientError::ApiError { ref message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_dispatch_error_mapping() {
        let not_found = ClientError::api_error(404, "{}");
        assert!(not_found.is_not_found());
        assert_eq!(
            not_found.into_dispatch_error("cluster", "pods"),
            DispatchError::unknown("cluster", "pods")
        );

        let bad_input = ClientError::api_error(400, r#"{"error":"missing field"}"#);
        assert!(bad_input.is_client_error());
        assert!(matches!(
            bad_input.into_dispatch_error("cluster", "pods"),
            DispatchError::InvalidInput { .. }
        ));

        let failure = ClientError::api_error(500, r#"{"error":"boom"}"#);
        assert_eq!(
            failure.into_dispatch_error("cluster", "pods"),
            DispatchError::Remote {
                status: 500,
                message: "boom".to_string()
            }
        );
    }
}
