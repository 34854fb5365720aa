//! Glob lookup over the output tree.
//!
//! Paths are matched relative to the root with `/` separators and shell glob
//! rules: `*` and `?` never cross a `/`, and a leading `.` must be matched
//! literally.

use glob::{MatchOptions, Pattern};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SHELL_GLOB: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A file found under the root whose relative path matched the pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Full path to the file
    pub path: PathBuf,

    /// Relative path from the root, `/`-separated
    pub relative_path: String,
}

/// Collect every regular file (or symlink) under `root` matching `pattern`.
///
/// Directories are never returned. Results are sorted by relative path.
///
/// # Errors
/// * `InvalidInput` if `pattern` is not a valid glob
/// * any error raised while reading the tree
pub fn matching_files(root: &Path, pattern: &str) -> io::Result<Vec<MatchedFile>> {
    // Relative paths never carry empty or `.` components
    let components: Vec<&str> = pattern
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();

    let compiled = Pattern::new(&components.join("/"))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    // `*` cannot cross a separator, so a match sits at exactly this depth
    let depth = components.len();
    if depth == 0 {
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name();

    let mut files = Vec::new();

    for entry in walker {
        let entry = entry?;

        if entry.file_type().is_dir() {
            continue;
        }

        let relative_path = relative_slash_path(entry.path(), root);
        if compiled.matches_with(&relative_path, SHELL_GLOB) {
            files.push(MatchedFile {
                path: entry.into_path(),
                relative_path,
            });
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
