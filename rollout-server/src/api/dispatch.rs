//! Dispatch API Handlers
//!
//! Exposes the local handler table so another layer can reach it through a
//! `RemoteDispatcher`.

use axum::{
    Json,
    extract::{Path, State},
};
use rollout_core::Dispatcher;
use serde_json::Value as JsonValue;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// GET /api/procedures
/// List every procedure this process hosts
pub async fn list_procedures(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dispatcher.local().procedures())
}

/// POST /api/dispatch/{module}/{procedure}
/// Invoke a procedure, forwarding it upstream when this layer does not host it
pub async fn dispatch(
    State(state): State<AppState>,
    Path((module, procedure)): Path<(String, String)>,
    Json(input): Json<JsonValue>,
) -> ApiResult<Json<JsonValue>> {
    tracing::debug!(
        "Serving {}.{} on the {} layer",
        module,
        procedure,
        state.dispatcher.layer()
    );

    let output = state.dispatcher.dispatch(&module, &procedure, input).await?;

    Ok(Json(output))
}
