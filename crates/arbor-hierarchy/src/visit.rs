//! Depth-first traversal with early exit.

use std::ops::ControlFlow;

use crate::error::HierarchyResult;
use crate::group::Group;
use crate::node::Node;

impl Group {
    /// Walk every descendant in pre-order, siblings sorted by name.
    ///
    /// `f` is never called with this group itself. The walk stops at the
    /// first [`ControlFlow::Break`] and returns its value; `Ok(None)` means
    /// every descendant was visited. Each visited group is listed exactly
    /// once and nothing is memoized.
    pub fn visit_values<T, F>(&self, mut f: F) -> HierarchyResult<Option<T>>
    where
        F: FnMut(&Node) -> ControlFlow<T>,
    {
        self.walk(&mut f)
    }

    fn walk<T, F>(&self, f: &mut F) -> HierarchyResult<Option<T>>
    where
        F: FnMut(&Node) -> ControlFlow<T>,
    {
        for member in self.members()? {
            let (_, node) = member?;
            if let ControlFlow::Break(value) = f(&node) {
                return Ok(Some(value));
            }
            if let Node::Group(child) = &node {
                if let Some(value) = child.walk(f)? {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    /// Like [`Group::visit_values`], passing each descendant's path relative
    /// to this group, without a leading separator.
    pub fn visit<T, F>(&self, mut f: F) -> HierarchyResult<Option<T>>
    where
        F: FnMut(&str) -> ControlFlow<T>,
    {
        self.visit_items(|path, _| f(path))
    }

    /// Alias of [`Group::visit`].
    pub fn visit_keys<T, F>(&self, f: F) -> HierarchyResult<Option<T>>
    where
        F: FnMut(&str) -> ControlFlow<T>,
    {
        self.visit(f)
    }

    /// Like [`Group::visit`], also passing the node.
    pub fn visit_items<T, F>(&self, mut f: F) -> HierarchyResult<Option<T>>
    where
        F: FnMut(&str, &Node) -> ControlFlow<T>,
    {
        let base = self.key_prefix().len();
        self.visit_values(|node| f(&node.path()[base..], node))
    }
}
