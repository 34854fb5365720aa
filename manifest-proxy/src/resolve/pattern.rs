//! Selection of remote files by glob pattern.
//!
//! Remote paths are matched as whole strings, fnmatch style: `*` and `?` also
//! match `/`. A pattern that does not compile as a glob is compared literally.

use glob::{MatchOptions, Pattern};

const REMOTE_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Pick the file a selection pattern resolves to.
///
/// When several paths match, the first one in iteration order wins. Callers
/// pass manifest paths in manifest document order, which makes the choice
/// deterministic for a given manifest.
pub fn first_match<'a, I>(pattern: &str, paths: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut paths = paths.into_iter().map(String::as_str);

    match Pattern::new(pattern) {
        Ok(compiled) => paths.find(|path| compiled.matches_with(path, REMOTE_MATCH)),
        Err(_) => paths.find(|path| *path == pattern),
    }
}
