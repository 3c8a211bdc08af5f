//! # Adjacency Store Accessor
//!
//! Whole-map access to the links slot.
//!
//! The slot is always read in full and written in full; the store has no
//! partial update. Neither direction returns `Err`: a failed read degrades to
//! the empty map, a failed write is logged and reported as degraded.

use crate::formats::{self, Inspection, StoredValue};
use crate::graph::AdjacencyMap;
use crate::storage::KeyValueStore;
use crate::{LinkError, Outcome, Slot};
use tracing::{debug, warn};

/// Reads and writes the whole adjacency map at one slot.
#[derive(Debug)]
pub struct AdjacencyStore<S> {
    store: S,
    slot: Slot,
}

impl<S: KeyValueStore> AdjacencyStore<S> {
    /// Accessor for the default board-wide links slot.
    pub fn new(store: S) -> Self {
        Self::with_slot(store, Slot::default())
    }

    pub fn with_slot(store: S, slot: Slot) -> Self {
        Self { store, slot }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch and decode the whole map.
    ///
    /// An absent slot is the empty map. A store failure is
    /// `Degraded(empty, cause)`.
    pub fn read_all(&self) -> Outcome<AdjacencyMap> {
        match self.store.get(&self.slot) {
            Ok(raw) => {
                let inspection = formats::inspect(raw.as_ref());
                debug!(
                    slot = %self.slot.path(),
                    encoding = ?inspection.encoding,
                    nodes = inspection.map.node_count(),
                    "read links"
                );
                Outcome::Ok(inspection.map)
            }
            Err(e) => {
                warn!(slot = %self.slot.path(), error = %e, "links read failed, using empty map");
                Outcome::Degraded(AdjacencyMap::new(), e)
            }
        }
    }

    /// Fetch and classify the raw stored value.
    pub fn inspect(&self) -> Result<Inspection, LinkError> {
        let raw = self.store.get(&self.slot)?;
        Ok(formats::inspect(raw.as_ref()))
    }

    /// Encode and persist the whole map in one `set`.
    ///
    /// Best effort: failures are logged, never retried.
    pub fn write_all(&self, map: &AdjacencyMap) -> Outcome<()> {
        let result = formats::encode(map).and_then(|value| self.write_raw(value));
        match result {
            Ok(()) => {
                debug!(
                    slot = %self.slot.path(),
                    nodes = map.node_count(),
                    edges = map.edge_count(),
                    "wrote links"
                );
                Outcome::Ok(())
            }
            Err(e) => {
                warn!(slot = %self.slot.path(), error = %e, "links write failed");
                Outcome::Degraded((), e)
            }
        }
    }

    /// Overwrite the slot with a raw value.
    pub fn write_raw(&self, value: StoredValue) -> Result<(), LinkError> {
        self.store.set(&self.slot, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;
    use crate::storage::MemoryStore;
    use serde_json::json;

    struct DownStore;

    impl KeyValueStore for DownStore {
        fn get(&self, _slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
            Err(LinkError::Store("unreachable".into()))
        }

        fn set(&self, _slot: &Slot, _value: StoredValue) -> Result<(), LinkError> {
            Err(LinkError::Store("unreachable".into()))
        }
    }

    #[test]
    fn read_absent_slot_is_empty() {
        let accessor = AdjacencyStore::new(MemoryStore::new());
        let outcome = accessor.read_all();
        assert!(!outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        let accessor = AdjacencyStore::new(store.clone());
        let mut map = AdjacencyMap::new();
        map.insert_edge(
            &NodeId::new("c1").expect("id"),
            &NodeId::new("c2").expect("id"),
        );

        assert_eq!(accessor.write_all(&map), Outcome::Ok(()));
        assert_eq!(
            store.peek(accessor.slot()),
            Some(json!(r#"{"c1":["c2"],"c2":["c1"]}"#))
        );
        assert_eq!(accessor.read_all().into_value(), map);
    }

    #[test]
    fn failures_degrade() {
        let accessor = AdjacencyStore::new(DownStore);

        let read = accessor.read_all();
        assert!(read.is_degraded());
        assert!(read.value().is_empty());

        let write = accessor.write_all(&AdjacencyMap::new());
        assert_eq!(
            write,
            Outcome::Degraded((), LinkError::Store("unreachable".into()))
        );
        assert!(accessor.inspect().is_err());
    }
}
