//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rollout_core::DispatchError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownProcedure { .. } => ApiError::NotFound(err.to_string()),
            DispatchError::InvalidInput { .. } => ApiError::BadRequest(err.to_string()),
            DispatchError::Handler(msg) => ApiError::InternalError(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_errors_map_to_statuses() {
        let not_found = ApiError::from(DispatchError::unknown("cluster", "nodes")).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_request = ApiError::from(DispatchError::InvalidInput {
            procedure: "cluster.pods".to_string(),
            message: "missing field `cluster`".to_string(),
        })
        .into_response();
        assert_eq!(bad_request.status(), StatusCode::BAD_REQUEST);

        let failed = ApiError::from(DispatchError::handler("boom")).into_response();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let transport = ApiError::from(DispatchError::Transport("refused".to_string())).into_response();
        assert_eq!(transport.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
