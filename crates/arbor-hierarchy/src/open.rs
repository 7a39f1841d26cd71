//! Entry points: obtaining a root or sub-group handle over a store.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use arbor_store::{
    contains_array, contains_group, init_group, normalize_path, DirectoryStore, MemoryStore, Store,
};
use arbor_sync::Synchronizer;
use thiserror::Error;
use tracing::debug;

use crate::error::{HierarchyError, HierarchyResult};
use crate::group::{Group, GroupOptions};

/// Configuration for [`group`].
#[derive(Clone, Default)]
pub struct GroupConfig {
    /// Wipe whatever lives at `path` and start an empty group.
    pub overwrite: bool,
    pub chunk_store: Option<Arc<dyn Store>>,
    pub synchronizer: Option<Arc<dyn Synchronizer>>,
    /// Group path within the store; empty for the root.
    pub path: String,
}

/// Open a read-write group, initializing it if needed.
///
/// The group is initialized when `overwrite` is set or when no group exists
/// at the path yet.
pub fn group(store: Arc<dyn Store>, config: GroupConfig) -> HierarchyResult<Group> {
    let path = normalize_path(&config.path)?;
    if config.overwrite || !contains_group(store.as_ref(), &path)? {
        init_group(
            store.as_ref(),
            &path,
            config.chunk_store.as_deref(),
            config.overwrite,
        )?;
    }
    Group::open_normalized(
        store,
        path,
        GroupOptions {
            read_only: false,
            chunk_store: config.chunk_store,
            synchronizer: config.synchronizer,
        },
    )
}

/// How [`open_group`] treats existing content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// `r`: read-only, must exist.
    Read,
    /// `r+`: read-write, must exist.
    ReadWrite,
    /// `a`: read-write, create if missing.
    Append,
    /// `w`: create, replacing anything present.
    Write,
    /// `w-` or `x`: create, fail if anything is present.
    Create,
}

impl OpenMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::ReadWrite => "r+",
            Self::Append => "a",
            Self::Write => "w",
            Self::Create => "w-",
        }
    }

    pub fn is_read_only(self) -> bool {
        self == Self::Read
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized open mode string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid open mode {0:?}; expected one of r, r+, a, w, w-, x")]
pub struct InvalidOpenMode(pub String);

impl FromStr for OpenMode {
    type Err = InvalidOpenMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::Read),
            "r+" => Ok(Self::ReadWrite),
            "a" => Ok(Self::Append),
            "w" => Ok(Self::Write),
            "w-" | "x" => Ok(Self::Create),
            other => Err(InvalidOpenMode(other.to_string())),
        }
    }
}

/// Open a group with file-like mode semantics.
pub fn open_group(
    store: Arc<dyn Store>,
    mode: OpenMode,
    synchronizer: Option<Arc<dyn Synchronizer>>,
    path: &str,
) -> HierarchyResult<Group> {
    let path = normalize_path(path)?;
    let s = store.as_ref();
    match mode {
        OpenMode::Read | OpenMode::ReadWrite => {
            if contains_array(s, &path)? {
                return Err(HierarchyError::ContainsArray(path));
            }
            if !contains_group(s, &path)? {
                return Err(HierarchyError::GroupNotFound(path));
            }
        }
        OpenMode::Append => {
            if contains_array(s, &path)? {
                return Err(HierarchyError::ContainsArray(path));
            }
            if !contains_group(s, &path)? {
                init_group(s, &path, None, false)?;
            }
        }
        OpenMode::Write => init_group(s, &path, None, true)?,
        OpenMode::Create => {
            if contains_array(s, &path)? {
                return Err(HierarchyError::ContainsArray(path));
            }
            if contains_group(s, &path)? {
                return Err(HierarchyError::ContainsGroup(path));
            }
            init_group(s, &path, None, false)?;
        }
    }
    debug!(path = %path, mode = %mode, store = %store.location(), "opened group");
    Group::open_normalized(
        store,
        path,
        GroupOptions {
            read_only: mode.is_read_only(),
            chunk_store: None,
            synchronizer,
        },
    )
}

/// Root group over a fresh in-memory store.
pub fn memory_group() -> HierarchyResult<Group> {
    group(Arc::new(MemoryStore::new()), GroupConfig::default())
}

/// Root group over a directory on disk.
///
/// Modes that require an existing group fail with
/// [`HierarchyError::GroupNotFound`] without creating the directory.
pub fn open_directory(root: impl AsRef<Path>, mode: OpenMode) -> HierarchyResult<Group> {
    let root = root.as_ref();
    if matches!(mode, OpenMode::Read | OpenMode::ReadWrite) && !root.is_dir() {
        return Err(HierarchyError::GroupNotFound(root.display().to_string()));
    }
    let store = DirectoryStore::open(root)?;
    open_group(Arc::new(store), mode, None, "")
}
