//! Sync executor - reconciles the output tree with a file plan.
//!
//! For every planned file:
//! - check whether the local copy is stale (missing, wrong size or hash)
//! - remove stale artifacts matching the file's selection glob
//! - fetch the replacement
//!
//! Up-to-date files cause no network access and no writes. Per-file failures
//! are logged and leave the file stale for the next run.

use crate::fs::digest::{file_md5_hex, md5_hex};
use crate::fs::walker::matching_files;
use crate::resolve::{FilePlan, PlannedFile};
use crate::transfer::Fetcher;
use crate::utils::errors::{Result, SyncError};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Outcome counters of one sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Planned files inspected
    pub checked: usize,
    pub up_to_date: usize,
    pub fetched: usize,
    pub fetched_bytes: u64,
    /// Stale files whose download or write failed
    pub failed: usize,
    /// Stale artifacts removed through selection globs
    pub deleted: usize,
}

/// Whether the local copy of `file` must be fetched again.
///
/// Only a file with the expected size and content hash is current.
pub fn is_outdated(file: &PlannedFile) -> bool {
    let metadata = match std::fs::metadata(&file.local_path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("File '{}' not found", file.local_name);
            return true;
        }
        Err(e) => {
            warn!("Unable to inspect file '{}': {}", file.local_name, e);
            return true;
        }
    };

    if !metadata.is_file() {
        info!("File '{}' is not a regular file", file.local_name);
        return true;
    }

    if metadata.len() != file.expected_size {
        info!("File '{}' has invalid size", file.local_name);
        return true;
    }

    match file_md5_hex(&file.local_path) {
        Ok(hash) if hash == file.expected_hash => false,
        Ok(_) => {
            info!("File '{}' has invalid hash", file.local_name);
            true
        }
        Err(e) => {
            warn!("Unable to read file '{}': {}", file.local_name, e);
            true
        }
    }
}

/// Main sync executor
pub struct SyncExecutor<'a, F: ?Sized> {
    fetcher: &'a F,
    output_root: PathBuf,
}

impl<'a, F> SyncExecutor<'a, F>
where
    F: Fetcher + ?Sized,
{
    pub fn new(fetcher: &'a F, output_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_root: output_root.into(),
        }
    }

    /// Create the output root and every folder of the plan.
    ///
    /// Existing folders are fine. Any failure is fatal to the run, as no
    /// file could be written.
    pub fn create_folders(&self, plan: &FilePlan) -> Result<()> {
        let folders = std::iter::once(self.output_root.clone())
            .chain(plan.folders.iter().map(|f| self.output_root.join(f)));

        for path in folders {
            std::fs::create_dir_all(&path)
                .map_err(|source| SyncError::FolderCreate { path, source })?;
        }

        Ok(())
    }

    /// Delete every file under the output root matching the selection glob
    /// of `file`. Returns how many were removed.
    ///
    /// Matches that are the local path of another file in `plan` are kept;
    /// only orphaned artifacts and the stale copy of `file` itself go.
    pub fn remove_outdated(&self, file: &PlannedFile, plan: &FilePlan) -> usize {
        let Some(glob) = file.remote_glob.as_deref() else {
            debug!("No glob pattern for {}, skipping deletion", file.local_name);
            return 0;
        };

        let matches = match matching_files(&self.output_root, glob) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Unable to delete files matching '{}': {}", glob, e);
                return 0;
            }
        };

        let stale = matches.into_iter().map(|m| m.path).filter(|path| {
            let planned = plan
                .files
                .values()
                .any(|other| other.local_name != file.local_name && other.local_path == *path);
            if planned {
                debug!("Keeping '{}', it is planned on its own", path.display());
            }
            !planned
        });

        delete_files(stale)
    }

    /// Fetch `file` and write it to its local path, replacing any existing
    /// file. Returns the number of bytes written.
    pub async fn download(&self, file: &PlannedFile) -> Result<u64> {
        info!("Downloading file '{}'", file.local_name);

        let body = self.fetcher.fetch(&file.remote_url).await?;

        if body.len() as u64 != file.expected_size || md5_hex(&body) != file.expected_hash {
            warn!(
                "Downloaded file '{}' does not match its manifest entry",
                file.local_name
            );
        }

        tokio::fs::write(&file.local_path, &body).await?;

        Ok(body.len() as u64)
    }

    /// Run the check, cleanup and fetch steps for every planned file.
    pub async fn sync(&self, plan: &FilePlan) -> SyncReport {
        let mut report = SyncReport::default();

        for file in plan.files.values() {
            report.checked += 1;

            if !is_outdated(file) {
                debug!("File '{}' is up to date", file.local_name);
                report.up_to_date += 1;
                continue;
            }

            report.deleted += self.remove_outdated(file, plan);

            match self.download(file).await {
                Ok(bytes) => {
                    report.fetched += 1;
                    report.fetched_bytes += bytes;
                }
                Err(e) => {
                    error!("Unable to download file '{}': {}", file.local_name, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Sync complete: {} checked, {} up to date, {} fetched ({} bytes), {} failed, {} deleted",
            report.checked,
            report.up_to_date,
            report.fetched,
            report.fetched_bytes,
            report.failed,
            report.deleted
        );

        report
    }
}

/// Remove each path, logging failures and carrying on. Returns how many
/// were removed.
fn delete_files(paths: impl IntoIterator<Item = PathBuf>) -> usize {
    let mut deleted = 0;
    for path in paths {
        info!("Deleting outdated file '{}'", path.display());
        match std::fs::remove_file(&path) {
            Ok(()) => deleted += 1,
            Err(source) => {
                let err = SyncError::Delete { path, source };
                warn!("{}", err);
            }
        }
    }

    deleted
}
