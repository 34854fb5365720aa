//! Error types for the sync engine.
//!
//! Errors scoped to a single source or file are logged and absorbed where they
//! occur; `ConfigLoad`, `FolderCreate` and `ManifestWrite` end the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unable to load config file '{}': {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Unable to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("Inconsistent manifest: {0}")]
    InconsistentManifest(String),

    #[error("Refusing to write outside the output folder: '{0}'")]
    UnsafePath(String),

    #[error("Unable to create output folder '{}': {source}", path.display())]
    FolderCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to save manifest to '{}': {reason}", path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    #[error("Unable to delete '{}': {source}", path.display())]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigLoad { .. }
                | SyncError::FolderCreate { .. }
                | SyncError::ManifestWrite { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
