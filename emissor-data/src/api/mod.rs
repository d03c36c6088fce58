//! HTTP API for emissor-data

pub mod event;
pub mod health;
pub mod scenario;

pub use event::publish_event;
pub use health::health_routes;
pub use scenario::{current_scenario_id, scenario_for_element};
