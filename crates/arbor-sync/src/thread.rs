//! In-process synchronizer backed by a map of named mutexes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::Synchronizer;

/// Synchronizer for threads sharing one process.
///
/// Locks are created on demand and kept for the synchronizer's lifetime, so
/// every caller asking for the same name contends on the same mutex.
#[derive(Debug, Default)]
pub struct ThreadSynchronizer {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct lock names handed out so far.
    pub fn lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Synchronizer for ThreadSynchronizer {
    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    fn kind(&self) -> &'static str {
        "ThreadSynchronizer"
    }
}
