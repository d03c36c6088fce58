//! Event intake for producers outside this process

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use emissor_common::events::EmissorEvent;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /event/:topic
///
/// Publishes the JSON event on the bus under `topic`.
pub async fn publish_event(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    payload: Result<Json<EmissorEvent>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(event) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    debug!("Received {} on {}", event.event_type(), topic);
    state.event_bus.publish(&topic, event);
    Ok(StatusCode::ACCEPTED)
}
