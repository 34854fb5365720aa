//! Source resolution - turns source selection rules into a file plan.
//!
//! Each source's manifest is downloaded and its `entries` and `renames`
//! patterns are resolved to concrete remote files. The per-source results
//! are merged into one [`FilePlan`] keyed by local name; a later source
//! replaces an earlier one's file with the same local name.

pub mod pattern;

use self::pattern::first_match;
use crate::config::{Config, SourceConfig};
use crate::manifest::Manifest;
use crate::transfer::{file_url, Fetcher};
use crate::utils::errors::{Result, SyncError};
use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

/// One local file the run keeps in sync with its remote origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Path relative to the output root; unique within a plan
    pub local_name: String,

    /// Path of the file in the source manifest
    pub remote_name: String,

    pub remote_url: String,

    /// Selection pattern when it expanded to a different name. Stale files
    /// matching it are removed before the replacement is fetched.
    pub remote_glob: Option<String>,

    pub expected_size: u64,
    pub expected_hash: String,

    /// Where the file lives on disk
    pub local_path: PathBuf,
}

/// Merged set of files a run keeps in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePlan {
    pub files: BTreeMap<String, PlannedFile>,

    /// Every directory (relative to the output root) holding a planned file
    pub folders: BTreeSet<String>,

    /// Newest timestamp among the merged manifests
    pub timestamp: i64,
}

impl FilePlan {
    /// Add a file, replacing any file with the same local name.
    pub fn insert(&mut self, file: PlannedFile) {
        for (idx, _) in file.local_name.match_indices('/') {
            let folder = &file.local_name[..idx];
            if !folder.is_empty() {
                self.folders.insert(folder.to_string());
            }
        }

        if let Some(previous) = self.files.insert(file.local_name.clone(), file) {
            debug!(
                "Replacing '{}' from an earlier source (was '{}')",
                previous.local_name, previous.remote_name
            );
        }
    }

    /// Fold a later source's contribution into this plan.
    pub fn merge(&mut self, other: FilePlan) {
        self.timestamp = self.timestamp.max(other.timestamp);
        self.folders.extend(other.folders);
        for file in other.files.into_values() {
            self.insert(file);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Download every source manifest and merge the resolved files.
///
/// Manifests are downloaded concurrently and merged in configuration order.
/// A source whose manifest cannot be fetched or decoded is logged and
/// contributes nothing, not even its timestamp.
pub async fn build_plan<F>(config: &Config, fetcher: &F) -> FilePlan
where
    F: Fetcher + ?Sized,
{
    let downloads = config.sources.iter().map(move |(key, source)| async move {
        let manifest = fetch_manifest(fetcher, &source.url).await;
        (key, source, manifest)
    });

    let mut plan = FilePlan::default();

    for (key, source, manifest) in join_all(downloads).await {
        match manifest {
            Ok(manifest) => {
                let contribution = resolve_source(key, source, &manifest, &config.output_path);
                info!(
                    "Source '{}' ({}): {} files selected, timestamp {}",
                    key,
                    manifest.db_id,
                    contribution.len(),
                    manifest.timestamp
                );
                plan.merge(contribution);
            }
            Err(e) => {
                error!(
                    "Unable to download source database '{}' from '{}': {}",
                    key, source.url, e
                );
            }
        }
    }

    plan
}

/// Download and decode a manifest archive.
pub async fn fetch_manifest<F>(fetcher: &F, url: &str) -> Result<Manifest>
where
    F: Fetcher + ?Sized,
{
    let data = fetcher.fetch(url).await?;
    Manifest::from_archive(&data)
}

/// Resolve one source's patterns against its manifest.
///
/// Plain `entries` keep the remote name locally; `renames` bind the matched
/// file to an explicit local name. Patterns without a match are skipped with
/// a warning.
pub fn resolve_source(
    key: &str,
    source: &SourceConfig,
    manifest: &Manifest,
    output_root: &Path,
) -> FilePlan {
    let mut plan = FilePlan {
        timestamp: manifest.timestamp,
        ..FilePlan::default()
    };

    let selections = source
        .entries
        .iter()
        .map(|pattern| (None, pattern))
        .chain(
            source
                .renames
                .iter()
                .map(|(local_name, pattern)| (Some(local_name), pattern)),
        );

    for (local_name, pattern) in selections {
        let Some(remote_name) = first_match(pattern, manifest.files.keys()) else {
            warn!(
                "No files matching pattern '{}' in source {} ({})",
                pattern, key, manifest.db_id
            );
            continue;
        };

        let local_name = local_name.map(String::as_str).unwrap_or(remote_name);

        match plan_file(local_name, remote_name, pattern, manifest, output_root) {
            Ok(file) => plan.insert(file),
            Err(e) => error!("Skipping '{}' from source {}: {}", local_name, key, e),
        }
    }

    plan
}

fn plan_file(
    local_name: &str,
    remote_name: &str,
    pattern: &str,
    manifest: &Manifest,
    output_root: &Path,
) -> Result<PlannedFile> {
    if !is_safe_local_name(local_name) {
        return Err(SyncError::UnsafePath(local_name.to_string()));
    }

    let entry = manifest.files.get(remote_name).ok_or_else(|| {
        SyncError::InconsistentManifest(format!(
            "'{}' matched but is not listed in {}",
            remote_name, manifest.db_id
        ))
    })?;

    Ok(PlannedFile {
        local_name: local_name.to_string(),
        remote_name: remote_name.to_string(),
        remote_url: file_url(&manifest.base_files_url, remote_name),
        remote_glob: (pattern != remote_name).then(|| pattern.to_string()),
        expected_size: entry.size,
        expected_hash: entry.hash.clone(),
        local_path: output_root.join(local_name),
    })
}

/// A local name must stay inside the output root.
fn is_safe_local_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
