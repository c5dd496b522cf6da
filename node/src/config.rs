//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use arbiter_types::ConflictParams;

use crate::{LogFormat, NodeError};

/// Configuration for an arbiter node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment and the event journal.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether engine events are appended to `events.jsonl` in the data directory.
    #[serde(default = "default_true")]
    pub journal_events: bool,

    /// Voting, punishment and reward parameters.
    #[serde(default)]
    pub conflict: ConflictParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./arbiter_data")
}

fn default_lmdb_map_size() -> usize {
    256 * 1024 * 1024
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.lmdb_map_size == 0 {
            return Err(NodeError::Config("lmdb_map_size must be positive".into()));
        }
        self.conflict.validate()?;
        Ok(())
    }

    /// Path of the event journal inside the data directory.
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("events.jsonl")
    }

    /// Path of the LMDB environment inside the data directory.
    pub fn lmdb_path(&self) -> PathBuf {
        self.data_dir.join("lmdb")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lmdb_map_size: default_lmdb_map_size(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            journal_events: default_true(),
            conflict: ConflictParams::default(),
        }
    }
}
