//! Arrays and attributes inside Arbor hierarchies.
//!
//! An array is an n-dimensional grid of fixed-size elements whose metadata
//! lives under `<path>/.zarray` and whose data is split into regular chunks
//! keyed `<path>/<i>.<j>...`. This crate provides the [`Array`] handle, the
//! constructors that initialize arrays in a store, and the [`Attributes`]
//! view shared by arrays and groups.
//!
//! # Modules
//!
//! - [`array`] -- the [`Array`] handle and whole-array chunk I/O
//! - [`attrs`] -- JSON attribute documents under `.zattrs`
//! - [`creation`] -- `create`, `empty`, `zeros`, `ones`, `full` and friends
//! - [`data`] -- in-memory [`ArrayData`] buffers and element encoding

pub mod array;
pub mod attrs;
pub mod creation;
pub mod data;
pub mod error;

pub use array::{Array, ArrayLocation};
pub use attrs::Attributes;
pub use creation::{
    array_from_data, create, default_chunks, empty, empty_like, full, full_like, ones, ones_like,
    zeros, zeros_like, ArrayOptions,
};
pub use data::{element_count, encode_fill_value, ArrayData, ArrayLike, Element};
pub use error::{ArrayError, ArrayResult};
