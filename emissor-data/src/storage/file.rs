//! File system scenario storage
//!
//! Layout under the base path:
//!
//! ```text
//! <base>/<scenario id>/<scenario id>.json   scenario metadata
//! <base>/<scenario id>/<modality>.json      signals of that modality
//! <base>/<scenario id>/<relative path>      stored media copies
//! ```
//!
//! Files are replaced atomically (write to a temp file, then rename).

use super::{ScenarioDocument, ScenarioStore, StorageError, StorageResult};
use emissor_common::{Modality, Scenario, Signal};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileScenarioStore {
    base_path: PathBuf,
}

impl FileScenarioStore {
    /// Open a store rooted at `base_path`, creating the folder if missing
    pub fn open(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn scenario_file(&self, scenario_id: &str) -> PathBuf {
        self.scenario_path(scenario_id)
            .join(format!("{}.json", scenario_id))
    }

    fn modality_file(&self, scenario_id: &str, modality: Modality) -> PathBuf {
        self.scenario_path(scenario_id)
            .join(format!("{}.json", modality.as_str()))
    }
}

impl ScenarioStore for FileScenarioStore {
    fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_document(&self, scenario: Scenario) -> StorageResult<ScenarioDocument> {
        let path = self.scenario_path(&scenario.id);
        fs::create_dir_all(&path)?;
        debug!("Created scenario folder {}", path.display());
        Ok(ScenarioDocument::new(scenario))
    }

    fn save_document(&self, document: &ScenarioDocument) -> StorageResult<()> {
        let scenario_id = &document.scenario.id;
        fs::create_dir_all(self.scenario_path(scenario_id))?;

        write_json_atomic(&self.scenario_file(scenario_id), &document.scenario)?;

        for modality in Modality::ALL {
            let signals: Vec<&Signal> = document.signals_of(modality).collect();
            let path = self.modality_file(scenario_id, modality);
            if !signals.is_empty() || path.exists() {
                write_json_atomic(&path, &signals)?;
            }
        }

        Ok(())
    }

    fn load_document(&self, scenario_id: &str) -> StorageResult<ScenarioDocument> {
        let path = self.scenario_file(scenario_id);
        if !path.exists() {
            return Err(StorageError::ScenarioNotFound(scenario_id.to_string()));
        }

        let scenario: Scenario = serde_json::from_slice(&fs::read(&path)?)?;
        let mut document = ScenarioDocument::new(scenario);
        for modality in Modality::ALL {
            for signal in self.load_modality(scenario_id, modality)? {
                document.append_signal(signal);
            }
        }

        Ok(document)
    }

    fn load_modality(&self, scenario_id: &str, modality: Modality) -> StorageResult<Vec<Signal>> {
        let path = self.modality_file(scenario_id, modality);
        if !path.exists() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&fs::read(&path)?)?)
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
