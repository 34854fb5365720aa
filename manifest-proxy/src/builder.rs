//! Output manifest generation.
//!
//! The published manifest describes the intended state of the output tree:
//! each planned file with the size and hash its source advertised. Files are
//! not re-hashed after the sync.

use crate::config::Config;
use crate::manifest::{Manifest, ManifestEntry, ManifestFolder};
use crate::resolve::FilePlan;
use crate::transfer::join_url;
use crate::utils::errors::{Result, SyncError};
use std::path::PathBuf;
use tracing::info;

pub struct ManifestBuilder<'a> {
    config: &'a Config,
    plan: &'a FilePlan,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(config: &'a Config, plan: &'a FilePlan) -> Self {
        Self { config, plan }
    }

    pub fn build(&self) -> Manifest {
        let files = self
            .plan
            .files
            .values()
            .map(|file| {
                (
                    file.local_name.clone(),
                    ManifestEntry {
                        hash: file.expected_hash.clone(),
                        size: file.expected_size,
                    },
                )
            })
            .collect();

        let folders = self
            .plan
            .folders
            .iter()
            .map(|folder| (folder.clone(), ManifestFolder::default()))
            .collect();

        Manifest {
            base_files_url: self.config.base_url.clone(),
            db_id: self.config.id.clone(),
            db_url: join_url(&self.config.base_url, &self.config.manifest_file_name()),
            files,
            folders,
            timestamp: self.plan.timestamp,
        }
    }

    /// Write the manifest archive to `<output_path>/<id>.json.zip`.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.config.manifest_path();
        let write_error = |reason: String| SyncError::ManifestWrite {
            path: path.clone(),
            reason,
        };

        let manifest = self.build();
        let data = manifest
            .to_archive(&self.config.manifest_entry_name())
            .map_err(|e| write_error(e.to_string()))?;

        std::fs::write(&path, data).map_err(|e| write_error(e.to_string()))?;

        info!(
            "Saved manifest '{}' ({} files, timestamp {}) to '{}'",
            manifest.db_id,
            manifest.files.len(),
            manifest.timestamp,
            path.display()
        );

        Ok(path)
    }
}
