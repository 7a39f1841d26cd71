use std::collections::BTreeSet;

use crate::error::{StoreError, StoreResult};

/// Flat, string-keyed byte store.
///
/// Keys encode hierarchical position with `/` as the segment separator. The
/// store itself never interprets keys or values; hierarchy semantics are
/// layered on top by [`crate::hierarchy`].
///
/// All implementations must satisfy these invariants:
/// - `get` on an absent key fails with [`StoreError::KeyNotFound`].
/// - `list_children` returns immediate next-level segment names only,
///   sorted and without duplicates.
/// - `delete_prefix` removes every key at or below the prefix.
/// - All I/O errors are propagated, never silently ignored.
pub trait Store: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete `key`. Returns `true` if the key existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// All keys in the store, sorted.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Identity of the underlying storage, used for store equality.
    ///
    /// Two handles refer to the same store iff their locations are equal.
    fn location(&self) -> String;

    /// Short type name, used in info reports.
    fn kind(&self) -> &'static str;

    /// Check whether `key` is present.
    ///
    /// Default implementation calls `get()`. Backends may override with a
    /// cheaper existence check.
    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(StoreError::KeyNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Immediate child segment names under the storage path `prefix`.
    ///
    /// `prefix` is a normalized path (no trailing separator); the empty
    /// string lists the root. Default implementation derives the names from
    /// `keys()`.
    fn list_children(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };
        let children: BTreeSet<String> = self
            .keys()?
            .iter()
            .filter_map(|key| key.strip_prefix(dir.as_str()))
            .filter_map(|rest| rest.split('/').next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Ok(children.into_iter().collect())
    }

    /// Remove every key stored at or below the storage path `prefix`.
    ///
    /// The empty prefix clears the whole store. Default implementation
    /// deletes matching keys one by one.
    fn delete_prefix(&self, prefix: &str) -> StoreResult<()> {
        let dir = format!("{prefix}/");
        for key in self.keys()? {
            if prefix.is_empty() || key == prefix || key.starts_with(&dir) {
                self.delete(&key)?;
            }
        }
        Ok(())
    }
}
