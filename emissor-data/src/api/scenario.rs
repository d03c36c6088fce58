//! Scenario id lookups
//!
//! Both endpoints answer in plain text. An element that cannot be resolved
//! answers 404 with the current scenario id as body, so a client may fall
//! back to it.

use axum::extract::{Path, State};
use tracing::debug;

use crate::error::{ApiError, ApiResult, DataError};
use crate::AppState;

/// GET /:element_id/scenario/id
pub async fn scenario_for_element(
    State(state): State<AppState>,
    Path(element_id): Path<String>,
) -> ApiResult<String> {
    let store = state.store.read().await;
    match store.scenario_for_element(&element_id) {
        Ok(scenario_id) => Ok(scenario_id),
        Err(DataError::NotFound(_)) => {
            debug!("No scenario for element {}", element_id);
            Err(ApiError::NotFound(
                store.current_scenario_id().unwrap_or_default(),
            ))
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /scenario/current/id
pub async fn current_scenario_id(State(state): State<AppState>) -> ApiResult<String> {
    state
        .store
        .read()
        .await
        .current_scenario_id()
        .ok_or_else(|| ApiError::NotFound(String::new()))
}
