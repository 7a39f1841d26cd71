//! Diagnostic summary of a group.

use std::fmt;

use serde::Serialize;

use crate::error::HierarchyResult;
use crate::group::Group;

/// Ordered `(label, value)` rows describing a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub rows: Vec<(String, String)>,
}

impl GroupInfo {
    /// Value of the first row with `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for GroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &self.rows {
            writeln!(f, "{label:<width$} : {value}")?;
        }
        Ok(())
    }
}

impl Group {
    /// Collect the info report. Lists the group's children twice.
    pub fn info(&self) -> HierarchyResult<GroupInfo> {
        let mut rows = vec![
            ("Name".to_string(), self.name()),
            ("Type".to_string(), "arbor_hierarchy::Group".to_string()),
            ("Read-only".to_string(), self.read_only().to_string()),
        ];
        if let Some(sync) = self.synchronizer() {
            rows.push(("Synchronizer type".into(), sync.kind().into()));
        }
        rows.push(("Store type".into(), self.store().kind().into()));
        if let Some(chunks) = self.chunk_store() {
            rows.push(("Chunk store type".into(), chunks.kind().into()));
        }

        let arrays: Vec<String> = self.array_keys()?.collect::<HierarchyResult<_>>()?;
        let groups: Vec<String> = self.group_keys()?.collect::<HierarchyResult<_>>()?;
        rows.push(("No. members".into(), (arrays.len() + groups.len()).to_string()));
        rows.push(("No. arrays".into(), arrays.len().to_string()));
        rows.push(("No. groups".into(), groups.len().to_string()));
        if !arrays.is_empty() {
            rows.push(("Arrays".into(), arrays.join(", ")));
        }
        if !groups.is_empty() {
            rows.push(("Groups".into(), groups.join(", ")));
        }
        Ok(GroupInfo { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupOptions;
    use crate::open::memory_group;
    use arbor_store::{init_group, DType, MemoryStore, Store};
    use arbor_sync::{Synchronizer, ThreadSynchronizer};
    use std::sync::Arc;

    #[test]
    fn rows_for_populated_group() {
        let root = memory_group().unwrap();
        root.create_group("foo", false).unwrap();
        root.create_group("bar", false).unwrap();
        root.zeros("baz", vec![3], DType::Int8, &Default::default()).unwrap();

        let info = root.info().unwrap();
        let labels: Vec<&str> = info.rows.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Name",
                "Type",
                "Read-only",
                "Store type",
                "No. members",
                "No. arrays",
                "No. groups",
                "Arrays",
                "Groups"
            ]
        );
        assert_eq!(info.get("Name"), Some("/"));
        assert_eq!(info.get("Store type"), Some("MemoryStore"));
        assert_eq!(info.get("No. members"), Some("3"));
        assert_eq!(info.get("Arrays"), Some("baz"));
        assert_eq!(info.get("Groups"), Some("bar, foo"));
    }

    #[test]
    fn optional_rows() {
        let store = Arc::new(MemoryStore::new());
        init_group(store.as_ref(), "g", None, false).unwrap();
        let g = crate::Group::open(
            store,
            "g",
            GroupOptions {
                read_only: true,
                chunk_store: Some(Arc::new(MemoryStore::new()) as Arc<dyn Store>),
                synchronizer: Some(Arc::new(ThreadSynchronizer::new()) as Arc<dyn Synchronizer>),
            },
        )
        .unwrap();
        let info = g.info().unwrap();
        assert_eq!(info.get("Name"), Some("/g"));
        assert_eq!(info.get("Read-only"), Some("true"));
        assert_eq!(info.get("Synchronizer type"), Some("ThreadSynchronizer"));
        assert_eq!(info.get("Chunk store type"), Some("MemoryStore"));
        assert_eq!(info.get("No. members"), Some("0"));
        assert_eq!(info.get("Arrays"), None);
        assert_eq!(info.get("Groups"), None);
    }

    #[test]
    fn display_aligns_labels() {
        let info = GroupInfo {
            rows: vec![
                ("Name".into(), "/".into()),
                ("No. members".into(), "0".into()),
            ],
        };
        assert_eq!(info.to_string(), "Name        : /\nNo. members : 0\n");
    }
}
