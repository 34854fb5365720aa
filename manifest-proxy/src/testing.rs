//! In-memory fetcher for exercising the sync stages without a network.

use crate::manifest::Manifest;
use crate::transfer::Fetcher;
use crate::utils::errors::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves fixed bodies by URL and records every request.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    bodies: HashMap<String, Bytes>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from(body));
        self
    }

    pub fn with_manifest(self, url: &str, manifest: &Manifest) -> Self {
        let archive = manifest
            .to_archive(&format!("{}.json", manifest.db_id))
            .expect("manifest should encode");
        self.with_body(url, archive)
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or_else(|| SyncError::Fetch {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })
    }
}
