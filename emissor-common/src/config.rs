//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file. Resolution order for the
//! file itself:
//! 1. Command-line argument (highest priority)
//! 2. `EMISSOR_DATA_CONFIG` environment variable
//! 3. `<user config dir>/emissor-data/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! Individual settings may still be overridden by the binary's command line.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "EMISSOR_DATA_CONFIG";

/// Default topics the data service listens on
pub const DEFAULT_TOPICS: &[&str] = &[
    "cltl.topic.scenario",
    "cltl.topic.text_in",
    "cltl.topic.text_out",
    "cltl.topic.microphone",
    "cltl.topic.image",
    "cltl.topic.annotations",
];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub event: EventConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

/// HTTP server binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Event bus subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Topics whose events are applied to the scenario storage
    pub topics: Vec<String>,
    /// Broadcast channel capacity
    pub bus_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            bus_capacity: 1000,
        }
    }
}

/// Scenario storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root folder of the stored scenarios
    pub path: PathBuf,
    /// Folder searched for brain logs to archive on scenario stop
    ///
    /// Defaults to `<path>/../rdf`.
    pub rdf_source: Option<PathBuf>,
    /// Batched flush interval; absent or negative flushes only at scenario
    /// boundaries, 0 flushes on every event and tick
    pub flush_interval_ms: Option<i64>,
    /// Flush after every mutating event (takes precedence over the interval)
    pub immediate_flush: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./storage/emissor"),
            rdf_source: None,
            flush_interval_ms: None,
            immediate_flush: false,
        }
    }
}

impl StorageConfig {
    /// Folder searched for brain logs
    pub fn rdf_source(&self) -> PathBuf {
        self.rdf_source
            .clone()
            .unwrap_or_else(|| self.path.join("..").join("rdf"))
    }
}

/// Media source settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Root folder `cltl-storage:` locators are resolved against
    ///
    /// Defaults to the parent of the storage path.
    pub source_root: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolve the config file path following the documented priority order
///
/// Returns `None` when no source names a file and no default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    dirs::config_dir()
        .map(|d| d.join("emissor-data").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config document
pub fn parse_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load configuration from an optional file path
///
/// `None` or a missing file yields defaults (with a warning for the latter);
/// an unreadable or malformed file is an error.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
