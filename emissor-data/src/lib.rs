//! emissor-data library - Emissor persistence service
//!
//! Consumes scenario, signal and annotation events from the event bus,
//! keeps the open scenario in memory and persists it as an emissor
//! scenario folder. A small HTTP API answers which scenario an element
//! belongs to.

use axum::http::{header, HeaderValue};
use axum::Router;
use emissor_common::events::EventBus;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod client;
pub mod error;
pub mod flush;
pub mod index;
pub mod ingest;
pub mod media;
pub mod query;
pub mod rdf;
pub mod service;
pub mod session;
pub mod storage;

pub use client::ScenarioClient;
pub use error::{ApiError, DataError, DataResult};
pub use flush::FlushPolicy;
pub use ingest::EmissorDataStore;
pub use service::{EmissorDataService, SharedStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Ingestion engine, read for lookups
    pub store: SharedStore,
    /// Bus the event intake publishes on
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(store: SharedStore, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }
}

/// Build application router
///
/// Every response disables client side caching.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/scenario/current/id", get(api::current_scenario_id))
        .route("/:element_id/scenario/id", get(api::scenario_for_element))
        .route("/event/:topic", post(api::publish_event))
        .merge(api::health_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
