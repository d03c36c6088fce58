//! # Emissor Common Library
//!
//! Shared code for the emissor data services including:
//! - Scenario representation (scenarios, signals, mentions, annotations)
//! - Event types (EmissorEvent enum) and the EventBus
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod representation;
pub mod time;

pub use error::{Error, Result};
pub use representation::{
    Annotation, ContainerRef, ContainerScope, Mention, Modality, Scenario, Segment, Signal,
    TemporalRuler,
};
