//! Configuration management for the manifest proxy.
//!
//! Loads a JSON configuration file. A path ending in `.toml` is read as TOML
//! with the same shape.

use crate::utils::errors::{Result, SyncError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifier of the manifest published for the output tree
    pub id: String,

    /// Root URL the output tree is published under
    pub base_url: String,

    /// Local directory the sources are mirrored into
    pub output_path: PathBuf,

    /// Remote sources, merged in the order they appear in the file
    pub sources: IndexMap<String, SourceConfig>,

    /// Upper bound for a single HTTP request, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Location of the remote manifest archive
    pub url: String,

    /// Glob patterns selecting remote files kept under their remote name
    #[serde(default)]
    pub entries: Vec<String>,

    /// Local name -> glob pattern selecting the remote file stored under it
    #[serde(default)]
    pub renames: IndexMap<String, String>,
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from a JSON (or `.toml`) file
    pub fn from_file(path: &Path) -> Result<Self> {
        let load_error = |reason: String| SyncError::ConfigLoad {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(&content).map_err(|e| load_error(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
        }
    }

    /// File name of the published manifest archive (`<id>.json.zip`)
    pub fn manifest_file_name(&self) -> String {
        format!("{}.json.zip", self.id)
    }

    /// Name of the JSON entry inside the published archive (`<id>.json`)
    pub fn manifest_entry_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Where the published manifest archive is written
    pub fn manifest_path(&self) -> PathBuf {
        self.output_path.join(self.manifest_file_name())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
