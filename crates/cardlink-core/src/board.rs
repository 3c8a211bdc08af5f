//! # Board Module
//!
//! The context object one surface uses to work with a board's links.
//!
//! A `Board` bundles the links accessor with the surface's migration state.
//! Operations first make sure the corruption guard has run for this board,
//! then delegate to the engine or reconciler. Two exceptions see the stored
//! value as it is:
//! - `stats` only inspects and never runs the guard
//! - `clean`, when it is the board's first operation, takes the guard's place
//!   so a legacy value is upgraded instead of reset
//!
//! No operation returns `Err`: failures come back as `Outcome::Degraded`
//! carrying the value a display should fall back to.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore`, shared between clones (tests, demos)
//! - `Persistent`: `RedbStore`, a redb file on disk
//!
//! Several boards may share one store; they do not coordinate with each
//! other beyond whole-value reads and writes.

use crate::accessor::AdjacencyStore;
use crate::engine::{CleanReport, LinkEngine, LinkStats};
use crate::graph::AdjacencyMap;
use crate::host::{NodeEnumerator, NodeResolver};
use crate::migration::{MigrationReport, MigrationState};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
use crate::{Candidate, LinkChange, LinkError, LiveNode, NodeId, Outcome, Slot};
use std::path::Path;

/// One surface's view of a board's links.
#[derive(Debug)]
pub struct Board<S = StorageBackend> {
    store: AdjacencyStore<S>,
    migration: MigrationState,
}

impl Default for Board<StorageBackend> {
    fn default() -> Self {
        Self::with_store(StorageBackend::default())
    }
}

impl Board<StorageBackend> {
    /// Create a board over a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board over an existing in-memory store.
    #[must_use]
    pub fn with_memory(store: MemoryStore) -> Self {
        Self::with_store(StorageBackend::InMemory(store))
    }

    /// Open or create a redb store at `path`, using `slot` for the links.
    pub fn with_redb(path: impl AsRef<Path>, slot: Slot) -> Result<Self, LinkError> {
        let store = RedbStore::open(path)?;
        Ok(Self::with_slot(StorageBackend::Persistent(store), slot))
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store.store().is_persistent()
    }
}

impl<S: KeyValueStore> Board<S> {
    /// Create a board over any store, using the default links slot.
    pub fn with_store(store: S) -> Self {
        Self::with_slot(store, Slot::default())
    }

    pub fn with_slot(store: S, slot: Slot) -> Self {
        Self {
            store: AdjacencyStore::with_slot(store, slot),
            migration: MigrationState::new(),
        }
    }

    /// Get a reference to the links accessor.
    pub fn store(&self) -> &AdjacencyStore<S> {
        &self.store
    }

    // =========================================================================
    // MIGRATION
    // =========================================================================

    /// Run the corruption guard unless it already ran for this board.
    pub fn ensure_migrated(&self) -> &MigrationReport {
        self.migration.ensure(&self.store)
    }

    /// The guard's report, if it has run.
    pub fn migration(&self) -> Option<&MigrationReport> {
        self.migration.report()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Links of `node`, in stored order.
    pub fn get_links(&self, node: &str) -> Outcome<Vec<NodeId>> {
        self.ensure_migrated();
        LinkEngine::get_links(&self.store, node)
    }

    /// Badge count for `node`.
    pub fn link_count(&self, node: &str) -> Outcome<usize> {
        self.ensure_migrated();
        LinkEngine::link_count(&self.store, node)
    }

    pub fn is_linked(&self, a: &str, b: &str) -> Outcome<bool> {
        self.ensure_migrated();
        LinkEngine::is_linked(&self.store, a, b)
    }

    /// The whole decoded map.
    pub fn snapshot(&self) -> Outcome<AdjacencyMap> {
        self.ensure_migrated();
        self.store.read_all()
    }

    /// Shape and counts of the stored value, before any repair.
    ///
    /// Read-only: does not run the guard.
    pub fn stats(&self) -> Outcome<LinkStats> {
        LinkEngine::stats(&self.store)
    }

    /// Picker entries for linking `node` to another card.
    pub fn candidates<E: NodeEnumerator + ?Sized>(
        &self,
        node: &str,
        enumerator: &E,
    ) -> Outcome<Vec<Candidate>> {
        self.ensure_migrated();
        LinkEngine::candidates(&self.store, node, enumerator)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    pub fn add_link(&self, a: &str, b: &str) -> Outcome<LinkChange> {
        self.ensure_migrated();
        LinkEngine::add_link(&self.store, a, b)
    }

    pub fn remove_link(&self, a: &str, b: &str) -> Outcome<LinkChange> {
        self.ensure_migrated();
        LinkEngine::remove_link(&self.store, a, b)
    }

    /// Replace all links of `node`.
    pub fn save_links(&self, node: &str, targets: &[&str]) -> Outcome<LinkChange> {
        self.ensure_migrated();
        LinkEngine::save_links(&self.store, node, targets)
    }

    /// Sanitise the whole blob now.
    ///
    /// If the guard has not run yet, the clean stands in for it and its
    /// result is recorded as the migration report.
    pub fn clean(&self) -> Outcome<CleanReport> {
        let mut first = None;
        self.migration.ensure_with(|| {
            let outcome = LinkEngine::clean(&self.store);
            let report = MigrationReport::from_clean(&outcome);
            first = Some(outcome);
            report
        });
        first.unwrap_or_else(|| LinkEngine::clean(&self.store))
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Resolve the links of `node`, pruning the ones that no longer exist.
    pub fn reconcile<R: NodeResolver + ?Sized>(
        &self,
        node: &str,
        resolver: &R,
    ) -> Outcome<Reconciliation> {
        self.ensure_migrated();
        Reconciler::reconcile(&self.store, node, resolver)
    }

    /// The live linked cards of `node`, for display.
    pub fn reconcile_and_fetch<R: NodeResolver + ?Sized>(
        &self,
        node: &str,
        resolver: &R,
    ) -> Outcome<Vec<LiveNode>> {
        self.ensure_migrated();
        Reconciler::reconcile_and_fetch(&self.store, node, resolver)
    }
}

// =============================================================================
// TESTS
// =============================================================================
