//! Manifest ("database") types.
//!
//! The same document shape is consumed from remote sources and published for
//! the output tree: every file with its size and content hash, the folders that
//! hold them and a freshness timestamp. On the wire it is a JSON document
//! packed as the single entry of a ZIP archive (see [`archive`]).

pub mod archive;

use crate::utils::errors::{Result, SyncError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A manifest document, serialized as `<id>.json` inside `<id>.json.zip`.
///
/// `files` and `folders` keep the order of the source document; pattern
/// selection relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Root that per-file download URLs are built from
    pub base_files_url: String,
    pub db_id: String,
    /// Where this manifest itself is published (informational)
    pub db_url: String,
    pub files: IndexMap<String, ManifestEntry>,
    pub folders: IndexMap<String, ManifestFolder>,
    /// Freshness marker, larger is newer
    pub timestamp: i64,
}

/// Metadata for a single file in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Lowercase hex MD5 of the file content
    pub hash: String,
    pub size: u64,
}

/// Folder marker. Serialized as `{}`; any content on read is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFolder {}

impl Manifest {
    /// Decode a manifest from its JSON document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| SyncError::MalformedManifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_manifest() -> Result<()> {
        let manifest = Manifest::from_json(
            br#"{
                "base_files_url": "https://files.example.org/",
                "db_id": "upstream",
                "db_url": "https://files.example.org/upstream.json.zip",
                "files": {
                    "games/b.rom": {"hash": "0cc175b9c0f1b6a831c399e269772661", "size": 1},
                    "games/a.rom": {"hash": "92eb5ffee6ae2fec3ad71c777531578f", "size": 1, "tags": ["x"]}
                },
                "folders": {"games": {}, "games/old": {"tags": []}},
                "timestamp": 1700000000,
                "extra": true
            }"#,
        )?;

        assert_eq!(manifest.db_id, "upstream");
        assert_eq!(manifest.timestamp, 1_700_000_000);
        assert_eq!(manifest.files["games/a.rom"].size, 1);
        assert_eq!(manifest.folders.len(), 2);

        // Document order, not sorted order
        let names: Vec<&str> = manifest.files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["games/b.rom", "games/a.rom"]);

        Ok(())
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = Manifest::from_json(
            br#"{"base_files_url": "", "db_id": "x", "db_url": "", "folders": {}, "timestamp": 1}"#,
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::MalformedManifest(ref msg) if msg.contains("files")));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let err = Manifest::from_json(
            br#"{"base_files_url": "", "db_id": "x", "db_url": "",
                 "files": {"a": {"hash": "h", "size": "big"}},
                 "folders": {}, "timestamp": 1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedManifest(_)));

        let err = Manifest::from_json(b"not json").unwrap_err();
        assert!(matches!(err, SyncError::MalformedManifest(_)));
    }

    #[test]
    fn test_folders_serialize_as_empty_objects() -> serde_json::Result<()> {
        let mut manifest = Manifest {
            base_files_url: "https://cdn.example.org".to_string(),
            db_id: "out".to_string(),
            db_url: "https://cdn.example.org/out.json.zip".to_string(),
            files: IndexMap::new(),
            folders: IndexMap::new(),
            timestamp: 7,
        };
        manifest.folders.insert("docs".to_string(), ManifestFolder::default());

        let json = serde_json::to_value(&manifest)?;
        assert_eq!(json["folders"], serde_json::json!({"docs": {}}));
        assert_eq!(json["files"], serde_json::json!({}));

        Ok(())
    }
}
