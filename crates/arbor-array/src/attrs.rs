//! User attributes stored as a JSON object under a fixed key.

use std::sync::Arc;

use arbor_store::{Store, StoreError};
use arbor_sync::{with_lock, Synchronizer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ArrayError, ArrayResult};

/// View over the attribute document of one group or array.
///
/// Every read goes to the store; nothing is cached. Mutations are a
/// read-modify-write of the whole document, serialized through the
/// synchronizer under the attribute key when one is configured.
#[derive(Clone)]
pub struct Attributes {
    store: Arc<dyn Store>,
    key: String,
    read_only: bool,
    synchronizer: Option<Arc<dyn Synchronizer>>,
}

impl Attributes {
    pub fn new(
        store: Arc<dyn Store>,
        key: impl Into<String>,
        read_only: bool,
        synchronizer: Option<Arc<dyn Synchronizer>>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            read_only,
            synchronizer,
        }
    }

    /// Store key holding the attribute document.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// The whole attribute document. Missing documents read as empty.
    pub fn as_map(&self) -> ArrayResult<Map<String, Value>> {
        let bytes = match self.store.get(&self.key) {
            Ok(bytes) => bytes,
            Err(StoreError::KeyNotFound(_)) => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes).map_err(StoreError::from)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Metadata(format!(
                "attributes at {:?} are not a JSON object: {other}",
                self.key
            ))
            .into()),
        }
    }

    pub fn get(&self, name: &str) -> ArrayResult<Option<Value>> {
        Ok(self.as_map()?.remove(name))
    }

    pub fn contains(&self, name: &str) -> ArrayResult<bool> {
        Ok(self.as_map()?.contains_key(name))
    }

    /// Attribute names, sorted.
    pub fn keys(&self) -> ArrayResult<Vec<String>> {
        let mut keys: Vec<String> = self.as_map()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn len(&self) -> ArrayResult<usize> {
        Ok(self.as_map()?.len())
    }

    pub fn is_empty(&self) -> ArrayResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> ArrayResult<()> {
        let value = value.into();
        self.write_op(|map| {
            map.insert(name.to_string(), value);
        })
    }

    /// Insert several attributes in one write.
    pub fn update<I, K, V>(&self, entries: I) -> ArrayResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.write_op(|map| {
            for (k, v) in entries {
                map.insert(k.into(), v.into());
            }
        })
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove(&self, name: &str) -> ArrayResult<Option<Value>> {
        let mut removed = None;
        self.write_op(|map| {
            removed = map.remove(name);
        })?;
        Ok(removed)
    }

    pub fn clear(&self) -> ArrayResult<()> {
        self.write_op(Map::clear)
    }

    fn write_op(&self, edit: impl FnOnce(&mut Map<String, Value>)) -> ArrayResult<()> {
        if self.read_only {
            return Err(ArrayError::ReadOnly(self.key.clone()));
        }
        let apply = || -> ArrayResult<()> {
            let mut map = self.as_map()?;
            edit(&mut map);
            let bytes = serde_json::to_vec_pretty(&Value::Object(map)).map_err(StoreError::from)?;
            self.store.set(&self.key, &bytes)?;
            debug!(key = %self.key, "attributes written");
            Ok(())
        };
        match &self.synchronizer {
            Some(sync) => with_lock(sync.as_ref(), &self.key, apply),
            None => apply(),
        }
    }
}

impl std::fmt::Debug for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attributes")
            .field("key", &self.key)
            .field("read_only", &self.read_only)
            .finish()
    }
}
