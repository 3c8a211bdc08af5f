//! # Storage Module
//!
//! The shared key-value store the links blob lives in.
//!
//! The store offers whole-value `get` and `set` only: no transactions across
//! calls, no compare-and-swap. Every surface on a board talks to the same
//! store, so two surfaces can interleave their reads and writes freely.
//!
//! ## Backends
//!
//! - `MemoryStore`: in-process, cloneable; clones share one board
//! - `RedbStore`: disk-backed via redb

mod memory;
mod redb_store;

pub use memory::{MemoryStore, StoreStats};
pub use redb_store::RedbStore;

use crate::formats::StoredValue;
use crate::{LinkError, Slot};
use std::sync::Arc;

// =============================================================================
// KEY-VALUE STORE TRAIT
// =============================================================================

/// Whole-value access to a shared key-value store.
///
/// Implementations must be `Send + Sync`: several surfaces may hold the same
/// store at once.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value at `slot`, `None` if nothing is stored.
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError>;

    /// Replace the value at `slot`.
    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
        (**self).get(slot)
    }

    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
        (**self).set(slot, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
        (**self).get(slot)
    }

    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
        (**self).set(slot, value)
    }
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Board.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-process store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb.
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
        match self {
            Self::InMemory(store) => store.get(slot),
            Self::Persistent(store) => store.get(slot),
        }
    }

    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
        match self {
            Self::InMemory(store) => store.set(slot, value),
            Self::Persistent(store) => store.set(slot, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_dispatches_to_memory() {
        let backend = StorageBackend::default();
        let slot = Slot::default();

        assert_eq!(backend.get(&slot).expect("get"), None);
        backend.set(&slot, json!("{\"a\":[\"b\"]}")).expect("set");
        assert_eq!(backend.get(&slot).expect("get"), Some(json!("{\"a\":[\"b\"]}")));
    }

    #[test]
    fn arc_store_shares_state() {
        let store = Arc::new(MemoryStore::new());
        let other = Arc::clone(&store);
        let slot = Slot::default();

        store.set(&slot, json!("x")).expect("set");
        assert_eq!(other.get(&slot).expect("get"), Some(json!("x")));
        assert!(!StorageBackend::default().is_persistent());
    }
}
