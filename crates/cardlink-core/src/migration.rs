//! # Legacy Migration / Corruption Guard
//!
//! One-shot repair of the stored links value.
//!
//! Older surfaces stored the map as a raw object instead of a JSON string,
//! and some wrote empty or non-string ids. The guard runs once per
//! [`MigrationState`] (one per `Board`) before anything else touches the
//! slot:
//!
//! | stored value                   | action                          |
//! |--------------------------------|---------------------------------|
//! | nothing                        | write `"{}"`                    |
//! | legacy object / malformed      | write `"{}"` (data discarded)   |
//! | canonical, needs normalising   | write the normalised encoding   |
//! | canonical, clean               | nothing                         |
//!
//! The legacy reset is destructive on purpose: the guard does not try to
//! upgrade unknown shapes field by field. Users re-add the links they need.

use crate::accessor::AdjacencyStore;
use crate::engine::CleanReport;
use crate::formats::{self, Encoding};
use crate::storage::KeyValueStore;
use crate::{LinkError, Outcome};
use std::sync::OnceLock;
use tracing::{info, warn};

/// What the guard found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationReport {
    /// Stored value was already canonical and well formed.
    Clean,
    /// Nothing was stored; the empty encoding was written.
    Initialized,
    /// A legacy or malformed value was replaced by the empty encoding.
    Reset(Encoding),
    /// A canonical value was normalised in place.
    Repaired { nodes: usize, edges: usize },
    /// The store failed; nothing was changed.
    Skipped(LinkError),
}

impl MigrationReport {
    /// The report of a full clean that ran in place of the guard.
    #[must_use]
    pub fn from_clean(outcome: &Outcome<CleanReport>) -> Self {
        let report = outcome.value();
        match outcome.cause() {
            Some(cause) => Self::Skipped(cause.clone()),
            None if !report.rewritten => Self::Clean,
            None if report.encoding == Encoding::Malformed => Self::Reset(Encoding::Malformed),
            None => Self::Repaired {
                nodes: report.nodes,
                edges: report.edges,
            },
        }
    }

    /// The guard wrote to the store.
    #[must_use]
    pub fn wrote(&self) -> bool {
        matches!(
            self,
            Self::Initialized | Self::Reset(_) | Self::Repaired { .. }
        )
    }
}

/// Inspects and repairs the links slot.
pub struct CorruptionGuard;

impl CorruptionGuard {
    /// Run the guard unconditionally.
    ///
    /// Prefer [`MigrationState::ensure`], which runs it at most once.
    pub fn run<S: KeyValueStore>(store: &AdjacencyStore<S>) -> MigrationReport {
        let inspection = match store.inspect() {
            Ok(inspection) => inspection,
            Err(e) => {
                warn!(error = %e, "migration skipped: links read failed");
                return MigrationReport::Skipped(e);
            }
        };

        let (report, write) = match inspection.encoding {
            Encoding::Canonical if !inspection.repaired => return MigrationReport::Clean,
            Encoding::Canonical => (
                MigrationReport::Repaired {
                    nodes: inspection.map.node_count(),
                    edges: inspection.map.edge_count(),
                },
                formats::encode(&inspection.map),
            ),
            Encoding::Absent => (MigrationReport::Initialized, Ok(formats::empty_encoding())),
            Encoding::Legacy | Encoding::Malformed => (
                MigrationReport::Reset(inspection.encoding),
                Ok(formats::empty_encoding()),
            ),
        };

        match write.and_then(|value| store.write_raw(value)) {
            Ok(()) => {
                info!(report = ?report, slot = %store.slot().path(), "migrated card links data");
                report
            }
            Err(e) => {
                warn!(error = %e, "migration write failed");
                MigrationReport::Skipped(e)
            }
        }
    }
}

/// Per-context "migrated once" state.
///
/// The first `ensure` runs the guard; concurrent callers wait for it and all
/// later callers get the recorded report.
#[derive(Debug, Default)]
pub struct MigrationState {
    report: OnceLock<MigrationReport>,
}

impl MigrationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the guard if it has not run yet for this state.
    pub fn ensure<S: KeyValueStore>(&self, store: &AdjacencyStore<S>) -> &MigrationReport {
        self.ensure_with(|| CorruptionGuard::run(store))
    }

    /// Record the report of `run` as the migration, unless one is recorded.
    ///
    /// `run` executes only if the guard has not run yet.
    pub fn ensure_with(&self, run: impl FnOnce() -> MigrationReport) -> &MigrationReport {
        self.report.get_or_init(run)
    }

    /// The recorded report, if the guard has run.
    #[must_use]
    pub fn report(&self) -> Option<&MigrationReport> {
        self.report.get()
    }
}
