//! Sorted member iteration.
//!
//! Each iterator lists the group's children once when created and then
//! classifies names one at a time as the consumer pulls them; handles are
//! built only for the item being yielded. Candidates that are neither arrays
//! nor groups are skipped.

use std::vec;

use arbor_array::Array;
use tracing::trace;

use crate::error::HierarchyResult;
use crate::group::Group;
use crate::node::{classify, Node, NodeKind};

/// Classified child names, optionally restricted to one kind.
struct Listing<'g> {
    group: &'g Group,
    names: vec::IntoIter<String>,
    only: Option<NodeKind>,
}

impl<'g> Listing<'g> {
    fn new(group: &'g Group, only: Option<NodeKind>) -> HierarchyResult<Self> {
        let names = group.store().list_children(group.path())?;
        Ok(Self {
            group,
            names: names.into_iter(),
            only,
        })
    }
}

impl Iterator for Listing<'_> {
    /// `(name, storage path, kind)`
    type Item = HierarchyResult<(String, String, NodeKind)>;

    fn next(&mut self) -> Option<Self::Item> {
        for name in self.names.by_ref() {
            let path = self.group.child_path(&name);
            let kind = match classify(self.group.store().as_ref(), &path) {
                Ok(kind) => kind,
                Err(e) => return Some(Err(e)),
            };
            match kind {
                NodeKind::Absent => trace!(path = %path, "skipping non-member key"),
                kind if self.only.map_or(true, |only| only == kind) => {
                    return Some(Ok((name, path, kind)))
                }
                _ => {}
            }
        }
        None
    }
}

/// Member names. See [`Group::keys`].
pub struct Keys<'g>(Listing<'g>);

impl Iterator for Keys<'_> {
    type Item = HierarchyResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|item| item.map(|(name, _, _)| name))
    }
}

/// `(name, node)` pairs. See [`Group::members`].
pub struct Members<'g>(Listing<'g>);

impl Iterator for Members<'_> {
    type Item = HierarchyResult<(String, Node)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (name, path, kind) = match self.0.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(self.0.group.open_node(path, kind).map(|node| (name, node)))
    }
}

/// `(name, group)` pairs. See [`Group::groups`].
pub struct Groups<'g>(Listing<'g>);

impl Iterator for Groups<'_> {
    type Item = HierarchyResult<(String, Group)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (name, path, _) = match self.0.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(self.0.group.open_group_at(path).map(|g| (name, g)))
    }
}

/// `(name, array)` pairs. See [`Group::arrays`].
pub struct Arrays<'g>(Listing<'g>);

impl Iterator for Arrays<'_> {
    type Item = HierarchyResult<(String, Array)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (name, path, _) = match self.0.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let location = self.0.group.array_location(path);
        Some(Array::open(location).map(|a| (name, a)).map_err(Into::into))
    }
}

impl Group {
    /// Names of all members, sorted.
    pub fn keys(&self) -> HierarchyResult<Keys<'_>> {
        Ok(Keys(Listing::new(self, None)?))
    }

    /// Names of sub-groups, sorted.
    pub fn group_keys(&self) -> HierarchyResult<Keys<'_>> {
        Ok(Keys(Listing::new(self, Some(NodeKind::Group))?))
    }

    /// Names of arrays, sorted.
    pub fn array_keys(&self) -> HierarchyResult<Keys<'_>> {
        Ok(Keys(Listing::new(self, Some(NodeKind::Array))?))
    }

    /// All members as `(name, node)` pairs, sorted by name.
    ///
    /// ```
    /// use arbor_hierarchy::memory_group;
    ///
    /// let root = memory_group().unwrap();
    /// root.create_group("foo", false).unwrap();
    /// root.create_group("bar", false).unwrap();
    ///
    /// let names: Vec<String> = root
    ///     .members()
    ///     .unwrap()
    ///     .map(|m| m.map(|(name, _)| name))
    ///     .collect::<Result<_, _>>()
    ///     .unwrap();
    /// assert_eq!(names, ["bar", "foo"]);
    /// ```
    pub fn members(&self) -> HierarchyResult<Members<'_>> {
        Ok(Members(Listing::new(self, None)?))
    }

    /// Sub-groups as `(name, group)` pairs, sorted by name.
    pub fn groups(&self) -> HierarchyResult<Groups<'_>> {
        Ok(Groups(Listing::new(self, Some(NodeKind::Group))?))
    }

    /// Arrays as `(name, array)` pairs, sorted by name.
    pub fn arrays(&self) -> HierarchyResult<Arrays<'_>> {
        Ok(Arrays(Listing::new(self, Some(NodeKind::Array))?))
    }
}
