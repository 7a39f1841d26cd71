//! Hierarchical groups over flat key-value stores.
//!
//! A [`Group`] turns a flat, string-keyed [`Store`](arbor_store::Store) into a
//! navigable tree of groups and arrays. The tree is never materialized:
//! every lookup, listing and traversal re-derives structure from sentinel
//! keys in the live store.
//!
//! # Architecture
//!
//! - **Path resolution** ([`Group::item_path`]) turns member names into
//!   normalized storage paths; a leading `/` makes a name absolute.
//! - **Classification** ([`classify`]) decides array, group or absent from
//!   sentinel presence alone.
//! - **Membership** ([`Group::keys`], [`Group::members`], ...) lists children
//!   once and classifies them lazily, in sorted order.
//! - **Traversal** ([`Group::visit_values`] and friends) walks descendants
//!   depth-first with early exit via [`std::ops::ControlFlow`].
//! - **Rendering** ([`Group::tree`]) and **reporting** ([`Group::info`]) sit on
//!   top of traversal and membership.
//! - **Mutation** ([`Group::create_group`], [`Group::require_dataset`], ...)
//!   always runs under the namespace guard: read-only handles fail first, and
//!   writers sharing a synchronizer serialize on one tree-wide lock.
//!
//! # Example
//!
//! ```
//! use arbor_hierarchy::memory_group;
//! use arbor_store::DType;
//!
//! let root = memory_group().unwrap();
//! let bar = root.create_group("bar", false).unwrap();
//! bar.zeros("baz", vec![100], DType::Float64, &Default::default()).unwrap();
//! root.create_group("foo", false).unwrap();
//!
//! assert_eq!(
//!     root.tree().unwrap().to_string(),
//!     "/\n ├── bar\n │   └── baz[...]\n └── foo\n"
//! );
//! ```

pub mod error;
pub mod group;
pub mod info;
pub mod members;
pub mod node;
pub mod open;
pub mod ops;
pub mod tree;
mod visit;

pub use error::{HierarchyError, HierarchyResult};
pub use group::{Group, GroupOptions};
pub use info::GroupInfo;
pub use members::{Arrays, Groups, Keys, Members};
pub use node::{classify, Node, NodeKind};
pub use open::{
    group, memory_group, open_directory, open_group, GroupConfig, InvalidOpenMode, OpenMode,
};
pub use ops::DatasetOptions;
pub use tree::{TreeNode, TreeView};

// Collaborator types that appear in this crate's signatures.
pub use arbor_array::{Array, ArrayData, ArrayLike, ArrayOptions, Attributes};
pub use arbor_store::DType;
