//! Storage path normalization.
//!
//! Normalized paths:
//! - Use `/` as the only separator (`\` is rewritten to `/`)
//! - Carry no leading or trailing `/`
//! - Contain no empty segments (runs of `/` collapse into one)
//! - Contain no `.` or `..` segments
//!
//! The empty string is the root path.

use crate::error::{StoreError, StoreResult};

/// Path segment separator.
pub const SEPARATOR: char = '/';

/// Normalize a user-supplied storage path.
///
/// Consecutive separators are collapsed silently rather than rejected, so
/// `"a//b"` and `"a/b"` name the same node. Relative segments are rejected.
///
/// # Examples
///
/// ```
/// use arbor_store::path::normalize_path;
///
/// assert_eq!(normalize_path("/foo//bar/").unwrap(), "foo/bar");
/// assert_eq!(normalize_path("").unwrap(), "");
/// assert!(normalize_path("foo/../bar").is_err());
/// ```
pub fn normalize_path(path: &str) -> StoreResult<String> {
    let unified = path.replace('\\', "/");
    let segments: Vec<&str> = unified
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();

    for segment in &segments {
        if *segment == "." || *segment == ".." {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: format!("relative segment {segment:?} not allowed"),
            });
        }
    }

    Ok(segments.join("/"))
}

/// Key prefix for a normalized path: `path + "/"`, or empty for the root.
pub fn key_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

/// Join a normalized path with a key or child segment.
pub fn join(path: &str, name: &str) -> String {
    format!("{}{name}", key_prefix(path))
}

/// Every proper ancestor of a normalized path, shallowest first.
///
/// The root is not included. `ancestors("a/b/c")` yields `["a", "a/b"]`.
pub fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .map(|n| segments[..n].join("/"))
        .collect()
}

/// Last segment of a normalized path (empty for the root).
pub fn basename(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or("")
}
