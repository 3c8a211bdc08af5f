//! In-process key-value store.
//!
//! Clones share the same underlying map, which is how several surfaces on
//! one board are modelled in tests and in the CLI's memory backend.

use super::KeyValueStore;
use crate::formats::StoredValue;
use crate::{LinkError, Slot};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of store calls seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub reads: usize,
    pub writes: usize,
}

#[derive(Debug, Default)]
struct Shared {
    values: Mutex<BTreeMap<String, StoredValue>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Shared in-memory store keyed by [`Slot::path`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `value` already present at `slot`.
    #[must_use]
    pub fn seeded(slot: &Slot, value: StoredValue) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.lock() {
            values.insert(slot.path(), value);
        }
        store
    }

    /// Reads and writes performed through any clone of this store.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.shared.reads.load(Ordering::SeqCst),
            writes: self.shared.writes.load(Ordering::SeqCst),
        }
    }

    /// Look at a value without counting it as a read.
    pub fn peek(&self, slot: &Slot) -> Option<StoredValue> {
        self.lock().ok()?.get(&slot.path()).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredValue>>, LinkError> {
        self.shared
            .values
            .lock()
            .map_err(|_| LinkError::Store("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(&slot.path()).cloned())
    }

    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        self.lock()?.insert(slot.path(), value);
        Ok(())
    }
}
