//! Flat key-value storage for Arbor hierarchies.
//!
//! This crate defines the [`Store`] contract that every backend satisfies and
//! the namespace primitives layered on it. A store is a flat, ordered mapping
//! from `/`-separated string keys to bytes; groups and arrays exist only as
//! sentinel keys under a path prefix.
//!
//! # Storage Backends
//!
//! - [`MemoryStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`DirectoryStore`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. A path is a group iff `<path>/.zgroup` exists, an array iff
//!    `<path>/.zarray` exists.
//! 2. No topology is cached: every query reads the live store.
//! 3. Paths are normalized before they reach a store (see [`path`]).
//! 4. All I/O errors are propagated, never silently ignored.

pub mod directory;
pub mod dtype;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod meta;
pub mod path;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use directory::DirectoryStore;
pub use dtype::{DType, DTypeKind};
pub use error::{StoreError, StoreResult};
pub use hierarchy::{contains_array, contains_group, init_array, init_group, listdir, rmdir};
pub use memory::MemoryStore;
pub use meta::{
    decode_array_metadata, decode_group_metadata, encode_array_metadata, encode_group_metadata,
    ArrayMetadata, GroupMetadata, Order, ARRAY_META_KEY, ATTRS_KEY, GROUP_META_KEY,
};
pub use path::{key_prefix, normalize_path};
pub use traits::Store;
