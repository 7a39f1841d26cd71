//! Named-lock synchronizers.
//!
//! A [`Synchronizer`] hands out mutual-exclusion resources keyed by arbitrary
//! string names. Hierarchy mutations take the lock named after the root group
//! sentinel, so every writer sharing one synchronizer is serialized
//! regardless of which subpath it touches. Readers never lock.
//!
//! # Modules
//!
//! - [`thread`]: [`ThreadSynchronizer`], locks shared between threads of
//!   one process

pub mod thread;

use std::sync::{Arc, Mutex};

use tracing::trace;

pub use thread::ThreadSynchronizer;

/// Provider of named locks.
///
/// Implementations must return the same underlying lock for the same name
/// for as long as any caller may hold it.
pub trait Synchronizer: Send + Sync {
    /// The lock associated with `name`, created on first use.
    fn lock_for(&self, name: &str) -> Arc<Mutex<()>>;

    /// Short type name, used in info reports.
    fn kind(&self) -> &'static str;
}

/// Run `op` while holding the lock named `name`.
///
/// The lock is released on every exit path, including early returns from
/// `op`. A lock poisoned by a panicking holder is recovered, since it
/// protects no data of its own.
pub fn with_lock<T>(sync: &dyn Synchronizer, name: &str, op: impl FnOnce() -> T) -> T {
    let lock = sync.lock_for(name);
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    trace!(name, "lock acquired");
    let result = op();
    trace!(name, "lock released");
    result
}
