use arbor_array::ArrayError;
use arbor_store::StoreError;
use thiserror::Error;

/// Errors from group and namespace operations.
///
/// Store and array failures that correspond to a namespace condition are
/// mapped onto the matching variant here, so each failure surfaces as exactly
/// one kind.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// An array occupies a path where a group or nothing was expected.
    #[error("path {0:?} contains an array")]
    ContainsArray(String),

    /// A group occupies a path where an array or nothing was expected.
    #[error("path {0:?} contains a group")]
    ContainsGroup(String),

    /// No group sentinel exists at the path.
    #[error("group not found: {0:?}")]
    GroupNotFound(String),

    /// Mutation attempted through a read-only handle.
    #[error("object is read-only: {0:?}")]
    ReadOnly(String),

    /// Lookup or deletion of a member that does not exist.
    #[error("item not found: {0:?}")]
    NotFound(String),

    /// An existing array is incompatible with the requested shape or dtype.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A path carries both the group and the array sentinel.
    #[error("path {0:?} is both a group and an array")]
    CorruptNamespace(String),

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("array error: {0}")]
    Array(#[source] ArrayError),
}

impl From<StoreError> for HierarchyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ContainsArray(path) => Self::ContainsArray(path),
            StoreError::ContainsGroup(path) => Self::ContainsGroup(path),
            StoreError::InvalidPath { path, reason } => Self::InvalidPath { path, reason },
            StoreError::ReadOnly => Self::ReadOnly(String::new()),
            other => Self::Store(other),
        }
    }
}

impl From<ArrayError> for HierarchyError {
    fn from(err: ArrayError) -> Self {
        match err {
            ArrayError::ReadOnly(path) => Self::ReadOnly(path),
            ArrayError::ArrayNotFound(path) => Self::NotFound(path),
            ArrayError::Store(e) => e.into(),
            other => Self::Array(other),
        }
    }
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conditions_map_to_namespace_kinds() {
        let err: HierarchyError = StoreError::ContainsArray("a".into()).into();
        assert!(matches!(err, HierarchyError::ContainsArray(p) if p == "a"));

        let err: HierarchyError = StoreError::InvalidPath {
            path: "..".into(),
            reason: "relative".into(),
        }
        .into();
        assert!(matches!(err, HierarchyError::InvalidPath { .. }));

        let err: HierarchyError = StoreError::KeyNotFound("k".into()).into();
        assert!(matches!(err, HierarchyError::Store(StoreError::KeyNotFound(_))));
    }

    #[test]
    fn nested_array_errors_are_unwrapped() {
        let err: HierarchyError = ArrayError::Store(StoreError::ContainsGroup("g".into())).into();
        assert!(matches!(err, HierarchyError::ContainsGroup(_)));

        let err: HierarchyError = ArrayError::ReadOnly("x".into()).into();
        assert!(matches!(err, HierarchyError::ReadOnly(_)));

        let err: HierarchyError = ArrayError::InvalidData("bad".into()).into();
        assert!(matches!(err, HierarchyError::Array(_)));
    }
}
