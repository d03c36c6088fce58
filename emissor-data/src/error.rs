//! Error types for emissor-data
//!
//! [`DataError`] covers the ingestion taxonomy: protocol errors (scenario
//! lifecycle misuse), resolution errors (orphaned mentions), serialization
//! errors (malformed signals) and storage failures. Media failures never
//! surface here; they are recovered per file.

use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Ingestion and lookup errors
#[derive(Debug, Error)]
pub enum DataError {
    /// A scenario is already open (including a repeated start of the same id)
    #[error("Scenario {current} is already started, tried to start {requested}")]
    AlreadyOpen { current: String, requested: String },

    /// Update or stop for a scenario that is not the open one
    #[error("Scenario {requested} is not started, current scenario is {current:?}")]
    NotOpen {
        requested: String,
        current: Option<String>,
    },

    /// Signal declares a different scenario than the open one
    #[error("Scenario {signal_scenario} is not the current scenario ({current}) for signal {signal_id}")]
    ScenarioMismatch {
        signal_id: String,
        signal_scenario: String,
        current: String,
    },

    /// Mention sits on a container that is neither a signal nor indexed
    #[error("Container {container_id} not found for scenario {scenario_id} and mention {mention_id}")]
    UnknownContainer {
        container_id: String,
        scenario_id: String,
        mention_id: String,
    },

    /// Lookup of an element id that is not part of the open scenario
    #[error("No scenario found for element {0}")]
    NotFound(String),

    /// Canonical copy of an incoming signal failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisting the scenario document failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using DataError
pub type DataResult<T> = Result<T, DataError>;

/// HTTP API error type
///
/// Lookup endpoints answer in plain text, so errors do too.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404); the body may carry a fallback value
    #[error("Resource not found")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(body) => (StatusCode::NOT_FOUND, body).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
