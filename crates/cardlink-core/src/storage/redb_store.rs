//! # redb-backed Key-Value Store
//!
//! A disk-backed slot store using the redb embedded database.
//!
//! Each slot is one row: `scope/visibility/key` → JSON bytes of the stored
//! value. Every `set` is its own write transaction, so a value is replaced
//! atomically, but nothing spans a `get` and a later `set`. That matches the
//! host store the links layer is written against.

use super::KeyValueStore;
use crate::formats::StoredValue;
use crate::{LinkError, Slot};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for slots: slot path -> serialized JSON value
const SLOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("slots");

fn io_err(e: impl std::fmt::Display) -> LinkError {
    LinkError::Io(e.to_string())
}

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LinkError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create the table up front so reads never see a missing table.
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(SLOTS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), LinkError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SLOTS).map_err(io_err)?;
        let Some(bytes) = table.get(slot.path().as_str()).map_err(io_err)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(bytes.value())
            .map_err(|e| LinkError::Store(format!("corrupt slot {}: {}", slot.path(), e)))?;
        Ok(Some(value))
    }

    fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
        let bytes = serde_json::to_vec(&value).map_err(|e| LinkError::Encode(e.to_string()))?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SLOTS).map_err(io_err)?;
            table
                .insert(slot.path().as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}
