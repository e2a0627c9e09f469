//! Allocation lock registry
//!
//! Available-prefix allocation against one parent is a race: two concurrent
//! creates may be handed overlapping address space by the upstream allocator.
//! The registry serializes all mutating calls per key. Keys are the parent
//! prefix ID for creation and the resource's own ID for update and delete.
//!
//! Entries are created lazily and never removed; cardinality is bounded by
//! the number of distinct prefixes touched during the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Keyed mutex registry scoped to one provider instance.
#[derive(Debug, Default)]
pub struct LockRegistry {
    entries: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Key under which allocation and mutation of a prefix are serialized.
pub fn allocation_key(id: u64) -> String {
    format!("availableprefixes_{}", id)
}

impl LockRegistry {
    /// New, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutex for `key`, creating it on first use.
    ///
    /// The returned guard owns the lock; dropping it on any path, including
    /// unwinding, releases the key.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(key.to_string()).or_default())
        };
        entry.lock_owned().await
    }
}
