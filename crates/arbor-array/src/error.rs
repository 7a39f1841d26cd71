//! Error types for array and attribute operations.

use arbor_store::{DType, StoreError};
use thiserror::Error;

/// Errors that can occur during array operations.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// No array sentinel exists at the path.
    #[error("array not found: {0:?}")]
    ArrayNotFound(String),

    /// The handle was opened read-only.
    #[error("array is read-only: {0:?}")]
    ReadOnly(String),

    /// Data shape differs from the array shape.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<u64>, actual: Vec<u64> },

    /// Data element type differs from the array element type.
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: DType, actual: DType },

    /// The fill value cannot be represented in the element type.
    #[error("invalid fill value {value} for dtype {dtype}")]
    InvalidFillValue { dtype: DType, value: String },

    /// A data buffer or stored chunk has the wrong size.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for array results.
pub type ArrayResult<T> = Result<T, ArrayError>;
