/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested key is not present in the store.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A storage path could not be normalized.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// An array already occupies the path.
    #[error("path {0:?} contains an array")]
    ContainsArray(String),

    /// A group already occupies the path.
    #[error("path {0:?} contains a group")]
    ContainsGroup(String),

    /// Metadata document could not be encoded or decoded.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Metadata(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
