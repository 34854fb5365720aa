//! ZIP container for manifest documents.
//!
//! A manifest archive holds exactly one entry with the JSON document. On read
//! the first entry is used whatever its name.

use super::Manifest;
use crate::utils::errors::{Result, SyncError};
use std::io::{Cursor, Read};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Largest manifest document accepted from an archive
const MAX_DOCUMENT_SIZE: u64 = 256 * 1024 * 1024;

impl Manifest {
    /// Decode a manifest from the bytes of a manifest archive.
    pub fn from_archive(data: &[u8]) -> Result<Self> {
        let malformed = |reason: String| SyncError::MalformedManifest(reason);

        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| malformed(format!("not a manifest archive: {e}")))?;

        if archive.is_empty() {
            return Err(malformed("manifest archive has no entries".to_string()));
        }

        let mut entry = archive
            .by_index(0)
            .map_err(|e| malformed(format!("unreadable archive entry: {e}")))?;

        // The declared size comes from the archive and is not trusted
        if entry.size() > MAX_DOCUMENT_SIZE {
            return Err(malformed(format!(
                "archive entry declares {} bytes, limit is {}",
                entry.size(),
                MAX_DOCUMENT_SIZE
            )));
        }

        let mut json = Vec::new();
        entry
            .by_ref()
            .take(MAX_DOCUMENT_SIZE + 1)
            .read_to_end(&mut json)
            .map_err(|e| malformed(format!("unreadable archive entry: {e}")))?;

        if json.len() as u64 > MAX_DOCUMENT_SIZE {
            return Err(malformed("archive entry is too large".to_string()));
        }

        Self::from_json(&json)
    }

    /// Encode this manifest as an archive with a single `entry_name` entry.
    pub fn to_archive(&self, entry_name: &str) -> ZipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(entry_name, options)?;
        serde_json::to_writer(&mut writer, self).map_err(std::io::Error::from)?;

        Ok(writer.finish()?.into_inner())
    }
}
