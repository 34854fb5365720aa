//! Byte transport for manifests and files.
//!
//! Everything the engine downloads goes through [`Fetcher`], so the sync
//! stages can run against an in-memory fetcher in tests.

use crate::utils::errors::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters left unescaped in remote file paths: unreserved plus `/`.
const FILE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Fetches the full body behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// HTTP(S) fetcher backed by a shared reqwest client.
///
/// `file://` URLs are read from the local filesystem, so a published output
/// tree can be used directly as a source.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_file_url(url: &str, parsed: &Url) -> Result<Bytes> {
        let path = parsed.to_file_path().map_err(|()| SyncError::Fetch {
            url: url.to_string(),
            reason: "not a local file path".to_string(),
        })?;

        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| SyncError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let fetch_error = |reason: String| SyncError::Fetch {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| fetch_error(e.to_string()))?;
        if parsed.scheme() == "file" {
            return Self::fetch_file_url(url, &parsed).await;
        }

        debug!("GET {}", url);
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }

        response.bytes().await.map_err(|e| fetch_error(e.to_string()))
    }
}

/// Join a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Download URL of a remote file: `base_files_url` joined with the
/// percent-encoded file path.
pub fn file_url(base_files_url: &str, remote_name: &str) -> String {
    let encoded = utf8_percent_encode(remote_name, FILE_PATH).to_string();
    join_url(base_files_url, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://cdn.example.org", "a.zip"), "https://cdn.example.org/a.zip");
        assert_eq!(join_url("https://cdn.example.org/", "a.zip"), "https://cdn.example.org/a.zip");
        assert_eq!(join_url("", "a.zip"), "a.zip");
    }

    #[test]
    fn test_file_url_encodes_path() {
        assert_eq!(
            file_url("https://files.example.org/pub/", "Games/Super Game [v1.2] (EU).zip"),
            "https://files.example.org/pub/Games/Super%20Game%20%5Bv1.2%5D%20%28EU%29.zip"
        );
        assert_eq!(
            file_url("https://files.example.org", "a-b_c~d.txt"),
            "https://files.example.org/a-b_c~d.txt"
        );
        assert_eq!(
            file_url("https://files.example.org", "café/ü.bin"),
            "https://files.example.org/caf%C3%A9/%C3%BC.bin"
        );
    }

    #[tokio::test]
    async fn test_fetch_file_url() -> Result<()> {
        let temp_dir = TempDir::new()?;
        std::fs::write(temp_dir.path().join("hello world.txt"), b"hello")?;

        let base = Url::from_directory_path(temp_dir.path()).expect("absolute temp path");
        let url = file_url(base.as_str(), "hello world.txt");

        let fetcher = HttpFetcher::new(Duration::from_secs(5))?;
        let body = fetcher.fetch(&url).await?;
        assert_eq!(&body[..], b"hello");

        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_missing_file_url_is_fetch_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = Url::from_directory_path(temp_dir.path()).expect("absolute temp path");

        let fetcher = HttpFetcher::new(Duration::from_secs(5))?;
        let err = fetcher.fetch(&file_url(base.as_str(), "missing.bin")).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_url_is_fetch_error() -> Result<()> {
        let fetcher = HttpFetcher::new(Duration::from_secs(5))?;
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch { .. }));
        Ok(())
    }
}
