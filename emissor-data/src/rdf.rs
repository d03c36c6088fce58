//! Archiving of brain RDF logs into a stopped scenario
//!
//! The knowledge graph writes `brain_log_<YYYY-MM-DD-HH-MM-SS>.trig` files
//! (local time). On scenario stop, every log written while the scenario ran
//! is copied to `<scenario folder>/rdf/`.

use emissor_common::time::{log_stamp, now_millis};
use emissor_common::Scenario;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const LOG_PREFIX: &str = "brain_log_";
const LOG_SUFFIX: &str = ".trig";

#[derive(Debug, Clone)]
pub struct RdfArchiver {
    source: PathBuf,
}

impl RdfArchiver {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Copy the logs within the scenario's time range to `scenario_dir/rdf`
    ///
    /// Returns the number of files copied. A missing source folder copies
    /// nothing.
    pub fn archive(&self, scenario: &Scenario, scenario_dir: &Path) -> io::Result<usize> {
        let rdf_path = scenario_dir.join("rdf");
        fs::create_dir_all(&rdf_path)?;
        info!("Created rdf folder {} for scenario", rdf_path.display());

        let (Some(start), Some(end)) = (
            log_stamp(scenario.start()),
            log_stamp(scenario.end().unwrap_or_else(now_millis)),
        ) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Scenario {} has an invalid time range", scenario.id),
            ));
        };

        if !self.source.is_dir() {
            debug!("No rdf source at {}", self.source.display());
            return Ok(0);
        }

        let logs: Vec<PathBuf> = WalkDir::new(&self.source)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .and_then(stamp_of)
                    .map(|stamp| stamp >= start.as_str() && stamp <= end.as_str())
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        for log in &logs {
            if let Some(name) = log.file_name() {
                fs::copy(log, rdf_path.join(name))?;
            }
        }

        info!("Copied {} rdf logs to scenario {}", logs.len(), scenario.id);
        debug!("Copied rdf logs {:?} to {}", logs, rdf_path.display());
        Ok(logs.len())
    }
}

/// Timestamp part of a brain log file name
fn stamp_of(file_name: &str) -> Option<&str> {
    file_name.strip_prefix(LOG_PREFIX)?.strip_suffix(LOG_SUFFIX)
}
