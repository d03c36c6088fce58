//! Scenario representation
//!
//! The in-memory and wire form of the emissor interaction-logging format:
//! a [`Scenario`] holds [`Signal`]s per [`Modality`], signals carry
//! [`Mention`]s, and mentions carry [`Annotation`]s. An annotation may itself
//! be a container that further mentions attach to (see [`ContainerRef`]).

mod mention;
mod scenario;
mod signal;

pub use mention::{Annotation, ContainerRef, ContainerScope, Mention};
pub use scenario::{Modality, Scenario, TemporalRuler};
pub use signal::{Segment, Signal};
