//! Scenario document storage
//!
//! The ingestion engine works on a [`ScenarioDocument`]: the scenario
//! metadata plus the append log of its signals. A [`ScenarioStore`] creates,
//! saves and loads documents; [`FileScenarioStore`] is the on-disk backend.

mod file;

pub use file::FileScenarioStore;

use emissor_common::{Modality, Scenario, Signal};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A scenario and the signals appended to it, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioDocument {
    pub scenario: Scenario,
    signals: Vec<Signal>,
}

impl ScenarioDocument {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            signals: Vec::new(),
        }
    }

    /// Append a signal to the document, returning its position
    pub fn append_signal(&mut self, signal: Signal) -> usize {
        self.signals.push(signal);
        self.signals.len() - 1
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal(&self, position: usize) -> Option<&Signal> {
        self.signals.get(position)
    }

    pub fn signal_mut(&mut self, position: usize) -> Option<&mut Signal> {
        self.signals.get_mut(position)
    }

    /// Signals of one modality, in append order
    pub fn signals_of(&self, modality: Modality) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(move |s| s.modality == modality)
    }
}

/// Storage backend for scenario documents
///
/// Implementations must be thread-safe (Send + Sync); the ingestion engine
/// is shared between the event worker and the HTTP handlers.
pub trait ScenarioStore: Send + Sync {
    /// Root folder of all stored scenarios
    fn base_path(&self) -> &Path;

    /// Folder holding one scenario's document and media copies
    fn scenario_path(&self, scenario_id: &str) -> PathBuf {
        self.base_path().join(scenario_id)
    }

    /// Create the storage location for a new scenario and return its document
    fn create_document(&self, scenario: Scenario) -> StorageResult<ScenarioDocument>;

    /// Persist the full document state
    fn save_document(&self, document: &ScenarioDocument) -> StorageResult<()>;

    /// Load a previously saved document
    fn load_document(&self, scenario_id: &str) -> StorageResult<ScenarioDocument>;

    /// Load the saved signals of one modality, in append order
    fn load_modality(&self, scenario_id: &str, modality: Modality) -> StorageResult<Vec<Signal>>;
}
