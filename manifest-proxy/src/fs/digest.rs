//! Content digests matching the ones recorded in manifests.

use md5::{Digest, Md5};
use std::fs::File;
use std::io;
use std::path::Path;

/// Lowercase hex MD5 of a byte buffer.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Lowercase hex MD5 of a file's content, streamed from disk.
pub fn file_md5_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_file_digest_matches_buffer_digest() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        let content = vec![0x5au8; 200_000];
        temp_file.write_all(&content)?;
        temp_file.flush()?;

        assert_eq!(file_md5_hex(temp_file.path())?, md5_hex(&content));

        Ok(())
    }
}
