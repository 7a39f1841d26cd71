//! The [`Group`] handle.
//!
//! A group is a view over a store scoped to a path prefix. It holds only the
//! store reference, its path and configuration: children are never cached,
//! and every navigation builds fresh handles from the live store.

use std::sync::Arc;

use arbor_array::{Array, ArrayLocation, Attributes};
use arbor_store::path::{basename, join, key_prefix};
use arbor_store::{
    decode_group_metadata, normalize_path, GroupMetadata, Store, StoreError, ATTRS_KEY,
    GROUP_META_KEY,
};
use arbor_sync::{with_lock, Synchronizer};

use crate::error::{HierarchyError, HierarchyResult};
use crate::node::{classify, Node, NodeKind};

/// Configuration carried by a group handle and inherited by its children.
#[derive(Clone, Default)]
pub struct GroupOptions {
    pub read_only: bool,
    /// Separate store for array chunks. Defaults to the metadata store.
    pub chunk_store: Option<Arc<dyn Store>>,
    pub synchronizer: Option<Arc<dyn Synchronizer>>,
}

impl std::fmt::Debug for GroupOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupOptions")
            .field("read_only", &self.read_only)
            .field("chunk_store", &self.chunk_store.as_ref().map(|s| s.location()))
            .field("synchronizer", &self.synchronizer.as_ref().map(|s| s.kind()))
            .finish()
    }
}

/// Handle to an initialized group.
#[derive(Clone)]
pub struct Group {
    store: Arc<dyn Store>,
    path: String,
    key_prefix: String,
    options: GroupOptions,
    meta: GroupMetadata,
    attrs: Attributes,
}

impl Group {
    /// Open the existing group at `path`.
    ///
    /// Fails with [`HierarchyError::ContainsArray`] if an array lives there
    /// and with [`HierarchyError::GroupNotFound`] if no group sentinel does.
    /// Opening never creates anything.
    pub fn open(store: Arc<dyn Store>, path: &str, options: GroupOptions) -> HierarchyResult<Self> {
        let path = normalize_path(path)?;
        Self::open_normalized(store, path, options)
    }

    pub(crate) fn open_normalized(
        store: Arc<dyn Store>,
        path: String,
        options: GroupOptions,
    ) -> HierarchyResult<Self> {
        if classify(store.as_ref(), &path)? == NodeKind::Array {
            return Err(HierarchyError::ContainsArray(path));
        }
        // Classification and this read are separate store calls; a sentinel
        // removed in between surfaces as GroupNotFound.
        let meta = match store.get(&join(&path, GROUP_META_KEY)) {
            Ok(bytes) => decode_group_metadata(&bytes)?,
            Err(StoreError::KeyNotFound(_)) => return Err(HierarchyError::GroupNotFound(path)),
            Err(e) => return Err(e.into()),
        };
        let attrs = Attributes::new(
            Arc::clone(&store),
            join(&path, ATTRS_KEY),
            options.read_only,
            options.synchronizer.clone(),
        );
        Ok(Self {
            key_prefix: key_prefix(&path),
            store,
            path,
            options,
            meta,
            attrs,
        })
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Normalized storage path; empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `path + "/"`, or empty for the root.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Path with a leading `/`; `/` for the root.
    pub fn name(&self) -> String {
        format!("/{}", self.path)
    }

    pub fn basename(&self) -> &str {
        basename(&self.path)
    }

    pub fn read_only(&self) -> bool {
        self.options.read_only
    }

    /// Explicitly configured chunk store, if any.
    pub fn chunk_store(&self) -> Option<&Arc<dyn Store>> {
        self.options.chunk_store.as_ref()
    }

    pub fn synchronizer(&self) -> Option<&Arc<dyn Synchronizer>> {
        self.options.synchronizer.as_ref()
    }

    pub fn options(&self) -> &GroupOptions {
        &self.options
    }

    pub fn metadata(&self) -> &GroupMetadata {
        &self.meta
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Resolve a member name to a storage path.
    ///
    /// Names starting with `/` are absolute and ignore this group's path;
    /// anything else is relative to it. Pure: the store is not consulted.
    pub fn item_path(&self, item: &str) -> HierarchyResult<String> {
        let path = normalize_path(item)?;
        if item.starts_with('/') || self.path.is_empty() {
            Ok(path)
        } else if path.is_empty() {
            Ok(self.path.clone())
        } else {
            Ok(format!("{}{path}", self.key_prefix))
        }
    }

    /// Whether `item` names an array or group.
    pub fn contains(&self, item: &str) -> HierarchyResult<bool> {
        let path = self.item_path(item)?;
        Ok(classify(self.store.as_ref(), &path)? != NodeKind::Absent)
    }

    /// Look up a member by name.
    pub fn get(&self, item: &str) -> HierarchyResult<Node> {
        let path = self.item_path(item)?;
        match classify(self.store.as_ref(), &path)? {
            NodeKind::Absent => Err(HierarchyError::NotFound(path)),
            kind => self.open_node(path, kind),
        }
    }

    /// Like [`Group::get`], but a missing member is `Ok(None)`.
    pub fn member(&self, item: &str) -> HierarchyResult<Option<Node>> {
        match self.get(item) {
            Ok(node) => Ok(Some(node)),
            Err(HierarchyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of members. Lists and classifies every child without opening
    /// it.
    pub fn len(&self) -> HierarchyResult<usize> {
        let mut count = 0;
        for key in self.keys()? {
            key?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> HierarchyResult<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn child_path(&self, name: &str) -> String {
        join(&self.path, name)
    }

    pub(crate) fn open_node(&self, path: String, kind: NodeKind) -> HierarchyResult<Node> {
        match kind {
            NodeKind::Group => Ok(Node::Group(self.open_group_at(path)?)),
            NodeKind::Array => Ok(Node::Array(Array::open(self.array_location(path))?)),
            NodeKind::Absent => Err(HierarchyError::NotFound(path)),
        }
    }

    pub(crate) fn open_group_at(&self, path: String) -> HierarchyResult<Group> {
        Self::open_normalized(Arc::clone(&self.store), path, self.options.clone())
    }

    pub(crate) fn array_location(&self, path: String) -> ArrayLocation {
        ArrayLocation {
            store: Arc::clone(&self.store),
            path,
            chunk_store: self.options.chunk_store.clone(),
            synchronizer: self.options.synchronizer.clone(),
            read_only: self.options.read_only,
        }
    }

    /// Run a mutation under the namespace guard.
    ///
    /// Read-only handles fail before `op` runs. With a synchronizer, `op`
    /// holds the single lock named after the group sentinel, so every
    /// mutation sharing that synchronizer is serialized tree-wide.
    pub(crate) fn write_op<T>(
        &self,
        op: impl FnOnce() -> HierarchyResult<T>,
    ) -> HierarchyResult<T> {
        if self.options.read_only {
            return Err(HierarchyError::ReadOnly(self.name()));
        }
        match &self.options.synchronizer {
            Some(sync) => with_lock(sync.as_ref(), GROUP_META_KEY, op),
            None => op(),
        }
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.store.location() == other.store.location()
            && self.options.read_only == other.options.read_only
            && self.path == other.path
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name())
            .field("store", &self.store.location())
            .field("read_only", &self.options.read_only)
            .finish()
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Group {:?}", self.name())?;
        if self.options.read_only {
            f.write_str(" read-only")?;
        }
        f.write_str(">")
    }
}
