//! Manifest Proxy Library
//!
//! Mirrors files listed in remote manifest archives into a local output tree
//! and publishes a merged manifest describing that tree.
//!
//! A run has three stages connected by a [`FilePlan`]:
//! 1. [`resolve::build_plan`] downloads every source manifest and resolves
//!    its selection patterns
//! 2. [`SyncExecutor`] fetches stale files and removes superseded ones
//! 3. [`ManifestBuilder`] writes `<id>.json.zip` to the output root

pub mod builder;
pub mod config;
pub mod executor;
pub mod fs;
pub mod manifest;
pub mod resolve;
pub mod transfer;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use builder::ManifestBuilder;
pub use config::{Config, SourceConfig};
pub use executor::{SyncExecutor, SyncReport};
pub use manifest::Manifest;
pub use resolve::{FilePlan, PlannedFile};
pub use transfer::{Fetcher, HttpFetcher};
pub use utils::errors::{Result, SyncError};

use tracing::info;

/// Run a full sync: resolve sources, reconcile the output tree and publish
/// the output manifest.
///
/// Per-source and per-file failures are logged and absorbed. Only failures
/// that leave the output tree unusable (folder creation, manifest write) are
/// returned.
pub async fn run<F>(config: &Config, fetcher: &F) -> Result<SyncReport>
where
    F: Fetcher + ?Sized,
{
    info!(
        "Syncing {} sources into '{}'",
        config.sources.len(),
        config.output_path.display()
    );

    let plan = resolve::build_plan(config, fetcher).await;
    info!(
        "File plan: {} files in {} folders, timestamp {}",
        plan.files.len(),
        plan.folders.len(),
        plan.timestamp
    );

    let executor = SyncExecutor::new(fetcher, &config.output_path);
    executor.create_folders(&plan)?;
    let report = executor.sync(&plan).await;

    ManifestBuilder::new(config, &plan).save()?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::digest::md5_hex;
    use crate::manifest::{ManifestEntry, ManifestFolder};
    use crate::testing::MemoryFetcher;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn upstream(timestamp: i64, files: &[(&str, &[u8])]) -> Manifest {
        Manifest {
            base_files_url: "https://up.example.org/files".to_string(),
            db_id: "upstream".to_string(),
            db_url: "https://up.example.org/upstream.json.zip".to_string(),
            files: files
                .iter()
                .map(|(name, content)| {
                    (
                        name.to_string(),
                        ManifestEntry {
                            hash: md5_hex(content),
                            size: content.len() as u64,
                        },
                    )
                })
                .collect(),
            folders: IndexMap::<String, ManifestFolder>::new(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_run_syncs_and_publishes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("out");

        let manifest = upstream(
            9,
            &[("tools/app_v2.exe", &b"v2 binary"[..]), ("readme.txt", &b"read me"[..])],
        );
        let fetcher = MemoryFetcher::default()
            .with_manifest("https://up.example.org/upstream.json.zip", &manifest)
            .with_body("https://up.example.org/files/tools/app_v2.exe", b"v2 binary".to_vec())
            .with_body("https://up.example.org/files/readme.txt", b"read me".to_vec());

        let mut sources = IndexMap::new();
        sources.insert(
            "up".to_string(),
            SourceConfig {
                url: "https://up.example.org/upstream.json.zip".to_string(),
                entries: vec!["readme.txt".to_string()],
                renames: [("bin/app.exe".to_string(), "tools/app_*.exe".to_string())]
                    .into_iter()
                    .collect(),
            },
        );
        let config = Config {
            id: "mirror".to_string(),
            base_url: "https://mirror.example.org".to_string(),
            output_path: root.clone(),
            sources,
            fetch_timeout_secs: 60,
        };

        let report = run(&config, &fetcher).await?;
        assert_eq!(report.fetched, 2);
        assert_eq!(std::fs::read(root.join("bin/app.exe"))?, b"v2 binary");

        let published = Manifest::from_archive(&std::fs::read(root.join("mirror.json.zip"))?)?;
        assert_eq!(published.timestamp, 9);
        assert_eq!(published.files["bin/app.exe"].hash, md5_hex(b"v2 binary"));
        assert!(published.folders.contains_key("bin"));

        let again = run(&config, &fetcher).await?;
        assert_eq!(again.fetched, 0);
        assert_eq!(again.deleted, 0);

        Ok(())
    }
}
