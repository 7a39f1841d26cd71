//! Text rendering of a group's subtree.

use std::fmt;
use std::ops::ControlFlow;

use serde::Serialize;

use crate::error::HierarchyResult;
use crate::group::Group;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Suffix marking array leaves.
pub const ARRAY_MARKER: &str = "[...]";

/// One labelled node of a rendered tree. Children keep insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn child_mut(&mut self, label: &str) -> &mut TreeNode {
        let idx = match self.children.iter().position(|c| c.label == label) {
            Some(idx) => idx,
            None => {
                self.children.push(TreeNode::new(label));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }
}

/// Printable hierarchy snapshot built by [`Group::tree`].
///
/// ```text
/// /
///  ├── bar
///  │   ├── baz
///  │   └── quux
///  │       └── baz[...]
///  └── foo
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeView {
    root: TreeNode,
}

impl TreeView {
    pub fn root(&self) -> &TreeNode {
        &self.root
    }
}

impl fmt::Display for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.root.label)?;
        let mut indent = String::from(" ");
        render_children(f, &self.root.children, &mut indent)
    }
}

fn render_children(
    f: &mut fmt::Formatter<'_>,
    nodes: &[TreeNode],
    indent: &mut String,
) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { LAST_BRANCH } else { BRANCH };
        writeln!(f, "{indent}{branch}{}", node.label)?;
        let len = indent.len();
        indent.push_str(if last { SPACE } else { PIPE });
        render_children(f, &node.children, indent)?;
        indent.truncate(len);
    }
    Ok(())
}

impl Group {
    /// Snapshot of this group's subtree for display.
    ///
    /// The root is labelled with the group's path (or `/` for the store
    /// root); array leaves carry the `[...]` suffix.
    pub fn tree(&self) -> HierarchyResult<TreeView> {
        let label = if self.path().is_empty() {
            "/".to_string()
        } else {
            self.path().to_string()
        };
        let mut root = TreeNode::new(label);
        self.visit_items(|path, node| -> ControlFlow<()> {
            let segments: Vec<&str> = path.split('/').collect();
            let mut cursor = &mut root;
            for (i, segment) in segments.iter().enumerate() {
                if i + 1 == segments.len() && node.is_array() {
                    cursor = cursor.child_mut(&format!("{segment}{ARRAY_MARKER}"));
                } else {
                    cursor = cursor.child_mut(segment);
                }
            }
            ControlFlow::Continue(())
        })?;
        Ok(TreeView { root })
    }
}

#[cfg(test)]
mod tests {
    use crate::open::memory_group;
    use arbor_store::DType;

    #[test]
    fn renders_root_tree() {
        let g1 = memory_group().unwrap();
        g1.create_group("foo", false).unwrap();
        let g3 = g1.create_group("bar", false).unwrap();
        g3.create_group("baz", false).unwrap();
        let g5 = g3.create_group("quux", false).unwrap();
        g5.zeros("baz", vec![100], DType::Float64, &Default::default()).unwrap();

        let expected = "\
/
 ├── bar
 │   ├── baz
 │   └── quux
 │       └── baz[...]
 └── foo
";
        assert_eq!(g1.tree().unwrap().to_string(), expected);

        let expected = "\
bar
 ├── baz
 └── quux
     └── baz[...]
";
        assert_eq!(g3.tree().unwrap().to_string(), expected);
    }

    #[test]
    fn nested_group_label_is_its_path() {
        let root = memory_group().unwrap();
        let c = root.create_group("a/b", false).unwrap();
        c.zeros("x", vec![1], DType::Int8, &Default::default()).unwrap();
        assert_eq!(c.tree().unwrap().to_string(), "a/b\n └── x[...]\n");
    }

    #[test]
    fn empty_group_renders_label_only() {
        let root = memory_group().unwrap();
        assert_eq!(root.tree().unwrap().to_string(), "/\n");
    }

    #[test]
    fn tree_structure_is_serializable() {
        let root = memory_group().unwrap();
        root.create_group("a", false).unwrap();
        let json = serde_json::to_value(root.tree().unwrap()).unwrap();
        assert_eq!(json["root"]["label"], "/");
        assert_eq!(json["root"]["children"][0]["label"], "a");
    }
}
