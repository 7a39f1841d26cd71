use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::Store;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// In-memory, `BTreeMap`-based store.
///
/// Intended for tests and embedding. Keys are held in sorted order behind a
/// `RwLock` for safe concurrent access. Values are cloned on read/write.
pub struct MemoryStore {
    id: u64,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Copy of every key/value pair, for byte-for-byte comparisons.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.read().expect("lock poisoned").clone()
    }

    /// Remove all keys from the store.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }

    fn location(&self) -> String {
        format!("memory://{}", self.id)
    }

    fn kind(&self) -> &'static str {
        "MemoryStore"
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn list_children(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };
        let map = self.entries.read().expect("lock poisoned");
        // Keys are sorted, so everything under `dir` is one contiguous range.
        let children: BTreeSet<String> = map
            .range(dir.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&dir))
            .filter_map(|key| key[dir.len()..].split('/').next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Ok(children.into_iter().collect())
    }

    fn delete_prefix(&self, prefix: &str) -> StoreResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        if prefix.is_empty() {
            map.clear();
            return Ok(());
        }
        let dir = format!("{prefix}/");
        map.retain(|key, _| key != prefix && !key.starts_with(&dir));
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("id", &self.id)
            .field("key_count", &self.len())
            .finish()
    }
}
