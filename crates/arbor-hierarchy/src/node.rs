//! Classification of storage paths and the tagged member handle.

use arbor_array::Array;
use arbor_store::{contains_array, contains_group, Store};
use tracing::warn;

use crate::error::{HierarchyError, HierarchyResult};
use crate::group::Group;

/// What a storage path denotes, decided purely by sentinel presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Array,
    Group,
    Absent,
}

/// Classify the normalized `path`.
///
/// Performs one existence check per sentinel against the live store. A path
/// carrying both sentinels is reported as [`HierarchyError::CorruptNamespace`].
pub fn classify(store: &dyn Store, path: &str) -> HierarchyResult<NodeKind> {
    let is_array = contains_array(store, path)?;
    let is_group = contains_group(store, path)?;
    match (is_array, is_group) {
        (true, true) => {
            warn!(path, "path carries both group and array sentinels");
            Err(HierarchyError::CorruptNamespace(path.to_string()))
        }
        (true, false) => Ok(NodeKind::Array),
        (false, true) => Ok(NodeKind::Group),
        (false, false) => Ok(NodeKind::Absent),
    }
}

/// A member of a group: either an array or a sub-group.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Array(Array),
    Group(Group),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Array(_) => NodeKind::Array,
            Self::Group(_) => NodeKind::Group,
        }
    }

    /// Storage path of the member.
    pub fn path(&self) -> &str {
        match self {
            Self::Array(a) => a.path(),
            Self::Group(g) => g.path(),
        }
    }

    /// Path with a leading `/`.
    pub fn name(&self) -> String {
        match self {
            Self::Array(a) => a.name(),
            Self::Group(g) => g.name(),
        }
    }

    pub fn basename(&self) -> &str {
        match self {
            Self::Array(a) => a.basename(),
            Self::Group(g) => g.basename(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(g) => Some(g),
            Self::Array(_) => None,
        }
    }

    /// The array handle, or [`HierarchyError::ContainsGroup`].
    pub fn into_array(self) -> HierarchyResult<Array> {
        match self {
            Self::Array(a) => Ok(a),
            Self::Group(g) => Err(HierarchyError::ContainsGroup(g.path().to_string())),
        }
    }

    /// The group handle, or [`HierarchyError::ContainsArray`].
    pub fn into_group(self) -> HierarchyResult<Group> {
        match self {
            Self::Group(g) => Ok(g),
            Self::Array(a) => Err(HierarchyError::ContainsArray(a.path().to_string())),
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Array(a) => write!(f, "{a}"),
            Self::Group(g) => write!(f, "{g}"),
        }
    }
}
