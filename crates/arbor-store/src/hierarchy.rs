//! Namespace primitives over a flat store.
//!
//! Everything here works purely through key presence: a path is a group iff
//! `<path>/.zgroup` exists and an array iff `<path>/.zarray` exists. Nothing
//! is cached.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::meta::{
    encode_array_metadata, encode_group_metadata, ArrayMetadata, GroupMetadata, ARRAY_META_KEY,
    GROUP_META_KEY,
};
use crate::path::{ancestors, join};
use crate::traits::Store;

/// Whether an array sentinel exists at the normalized `path`.
pub fn contains_array(store: &dyn Store, path: &str) -> StoreResult<bool> {
    store.contains_key(&join(path, ARRAY_META_KEY))
}

/// Whether a group sentinel exists at the normalized `path`.
pub fn contains_group(store: &dyn Store, path: &str) -> StoreResult<bool> {
    store.contains_key(&join(path, GROUP_META_KEY))
}

/// Immediate child names under the normalized `path`, sorted.
pub fn listdir(store: &dyn Store, path: &str) -> StoreResult<Vec<String>> {
    store.list_children(path)
}

/// Remove the whole subtree rooted at the normalized `path`.
pub fn rmdir(store: &dyn Store, path: &str) -> StoreResult<()> {
    debug!(path, "removing subtree");
    store.delete_prefix(path)
}

/// Initialize a group at `path`.
///
/// With `overwrite`, any existing content at `path` is removed first (from
/// both `store` and `chunk_store`). Without it, an existing array or group
/// at `path` is an error. Missing ancestor groups are created; an ancestor
/// that is an array is an error.
pub fn init_group(
    store: &dyn Store,
    path: &str,
    chunk_store: Option<&dyn Store>,
    overwrite: bool,
) -> StoreResult<()> {
    prepare_node(store, path, chunk_store, overwrite)?;
    require_parent_groups(store, path)?;
    write_group_sentinel(store, path)?;
    debug!(path, overwrite, "initialized group");
    Ok(())
}

/// Initialize an array at `path` with the given metadata.
///
/// Same overwrite and ancestor rules as [`init_group`].
pub fn init_array(
    store: &dyn Store,
    path: &str,
    chunk_store: Option<&dyn Store>,
    meta: &ArrayMetadata,
    overwrite: bool,
) -> StoreResult<()> {
    prepare_node(store, path, chunk_store, overwrite)?;
    require_parent_groups(store, path)?;
    store.set(&join(path, ARRAY_META_KEY), &encode_array_metadata(meta)?)?;
    debug!(path, overwrite, shape = ?meta.shape, dtype = %meta.dtype, "initialized array");
    Ok(())
}

fn prepare_node(
    store: &dyn Store,
    path: &str,
    chunk_store: Option<&dyn Store>,
    overwrite: bool,
) -> StoreResult<()> {
    if overwrite {
        rmdir(store, path)?;
        if let Some(chunks) = chunk_store {
            rmdir(chunks, path)?;
        }
    } else if contains_array(store, path)? {
        return Err(StoreError::ContainsArray(path.to_string()));
    } else if contains_group(store, path)? {
        return Err(StoreError::ContainsGroup(path.to_string()));
    }
    Ok(())
}

fn require_parent_groups(store: &dyn Store, path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Ok(());
    }
    // The root is an ancestor of every non-root path.
    for parent in std::iter::once(String::new()).chain(ancestors(path)) {
        if contains_array(store, &parent)? {
            return Err(StoreError::ContainsArray(parent));
        }
        if !contains_group(store, &parent)? {
            write_group_sentinel(store, &parent)?;
        }
    }
    Ok(())
}

fn write_group_sentinel(store: &dyn Store, path: &str) -> StoreResult<()> {
    let bytes = encode_group_metadata(&GroupMetadata::default())?;
    store.set(&join(path, GROUP_META_KEY), &bytes)
}
