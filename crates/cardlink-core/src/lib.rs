//! # cardlink-core
//!
//! The link-graph consistency layer for Cardlink - THE LOGIC.
//!
//! Cards on a board can be linked to each other. The relation is symmetric
//! and lives in one shared key-value slot as a serialized adjacency map.
//! Any number of surfaces (card badge, detail panel, management popup)
//! read and rewrite that slot without transactions, locks or version
//! tokens. This crate keeps the stored map well formed anyway:
//!
//! - every mutation is one whole-map read and at most one whole-map write,
//!   with both endpoints of an edge changed together
//! - decoding repairs whatever it finds into a symmetric, duplicate-free map
//! - a one-shot guard migrates legacy and corrupt stored shapes
//! - links to deleted cards are pruned lazily when a card's links are shown
//!
//! Concurrent surfaces can still lose each other's updates (last writer
//! wins); the store offers no compare-and-swap to prevent it.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - Deterministic ordering (`BTreeMap`)
//! - No error crosses the `Board` boundary; failures degrade to defaults

// =============================================================================
// MODULES
// =============================================================================

pub mod accessor;
pub mod board;
pub mod engine;
pub mod formats;
pub mod graph;
pub mod host;
pub mod migration;
pub mod primitives;
pub mod reconcile;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Candidate, LinkChange, LinkError, LiveNode, NodeFields, NodeId, Outcome, Scope, Slot,
    Visibility,
};

// =============================================================================
// RE-EXPORTS: Link Graph
// =============================================================================

pub use accessor::AdjacencyStore;
pub use board::Board;
pub use engine::{CleanReport, LinkEngine, LinkStats};
pub use graph::{AdjacencyMap, Violation};
pub use host::{NodeDirectory, NodeEnumerator, NodeResolver};
pub use migration::{CorruptionGuard, MigrationReport, MigrationState};
pub use reconcile::{Reconciler, Reconciliation};
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend, StoreStats};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{Encoding, Inspection, StoredValue, decode, encode, inspect};
