//! # Link Graph Engine
//!
//! Query and mutation of the linked-cards relation over an
//! [`AdjacencyStore`].
//!
//! Every mutating call is one `read_all`, an in-memory change, and at most
//! one `write_all`. Both endpoints of an edge change in the same write, so a
//! single call never leaves the blob half-linked. Nothing synchronises two
//! calls: concurrent surfaces can still lose each other's update, but each
//! write is a whole, symmetric snapshot.
//!
//! Invalid input (an empty id, a self link) is rejected without touching the
//! store. A mutation whose read failed writes nothing, so a degraded read can
//! never overwrite the blob with a near-empty map.

use crate::accessor::AdjacencyStore;
use crate::formats::{self, Encoding};
use crate::graph::AdjacencyMap;
use crate::host::NodeEnumerator;
use crate::storage::KeyValueStore;
use crate::{Candidate, LinkChange, LinkError, NodeId, Outcome};
use serde::Serialize;
use tracing::{debug, info, warn};

// =============================================================================
// REPORTS
// =============================================================================

/// Summary of the stored links blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkStats {
    pub encoding: Encoding,
    /// The stored value differs from the canonical encoding of its map.
    pub needs_cleaning: bool,
    pub nodes: usize,
    pub edges: usize,
}

/// Result of a full-map clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CleanReport {
    /// Shape found in the store before cleaning.
    pub encoding: Encoding,
    /// A cleaned value was written back.
    pub rewritten: bool,
    pub nodes: usize,
    pub edges: usize,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Stateless link operations; all state lives in the store.
pub struct LinkEngine;

impl LinkEngine {
    /// Links of `node` in stored order. Empty for unknown or empty ids.
    pub fn get_links<S: KeyValueStore>(
        store: &AdjacencyStore<S>,
        node: &str,
    ) -> Outcome<Vec<NodeId>> {
        let Ok(node) = NodeId::new(node) else {
            return Outcome::Ok(Vec::new());
        };
        store.read_all().map(|map| map.links(&node).to_vec())
    }

    /// Number of links of `node`, as shown on the card badge.
    pub fn link_count<S: KeyValueStore>(store: &AdjacencyStore<S>, node: &str) -> Outcome<usize> {
        Self::get_links(store, node).map(|links| links.len())
    }

    pub fn is_linked<S: KeyValueStore>(
        store: &AdjacencyStore<S>,
        a: &str,
        b: &str,
    ) -> Outcome<bool> {
        let (Ok(a), Ok(b)) = (NodeId::new(a), NodeId::new(b)) else {
            return Outcome::Ok(false);
        };
        store.read_all().map(|map| map.contains_edge(&a, &b))
    }

    /// Link `a` and `b` on both sides.
    pub fn add_link<S: KeyValueStore>(
        store: &AdjacencyStore<S>,
        a: &str,
        b: &str,
    ) -> Outcome<LinkChange> {
        let Some((a, b)) = edge_endpoints(a, b) else {
            return Outcome::Ok(LinkChange::Rejected);
        };
        let outcome = mutate(store, |map| map.insert_edge(&a, &b));
        if *outcome.value() == LinkChange::Applied {
            info!(%a, %b, "linked cards");
        }
        outcome
    }

    /// Unlink `a` and `b` on both sides. Removing a missing edge is a no-op.
    pub fn remove_link<S: KeyValueStore>(
        store: &AdjacencyStore<S>,
        a: &str,
        b: &str,
    ) -> Outcome<LinkChange> {
        let Some((a, b)) = edge_endpoints(a, b) else {
            return Outcome::Ok(LinkChange::Rejected);
        };
        let outcome = mutate(store, |map| map.remove_edge(&a, &b));
        if *outcome.value() == LinkChange::Applied {
            info!(%a, %b, "unlinked cards");
        }
        outcome
    }

    /// Replace the links of `node` with `targets`.
    ///
    /// Empty and self ids in `targets` are dropped. Reciprocal entries are
    /// updated in the same write.
    pub fn save_links<S: KeyValueStore>(
        store: &AdjacencyStore<S>,
        node: &str,
        targets: &[&str],
    ) -> Outcome<LinkChange> {
        let Ok(node) = NodeId::new(node) else {
            debug!("save_links rejected: empty node id");
            return Outcome::Ok(LinkChange::Rejected);
        };
        let targets: Vec<NodeId> = targets
            .iter()
            .filter_map(|t| NodeId::new(*t).ok())
            .collect();
        mutate(store, |map| map.replace_links(&node, &targets))
    }

    /// Cards `node` could be linked to: every listed card except `node`,
    /// flagged when already linked.
    pub fn candidates<S: KeyValueStore, E: NodeEnumerator + ?Sized>(
        store: &AdjacencyStore<S>,
        node: &str,
        enumerator: &E,
    ) -> Outcome<Vec<Candidate>> {
        let all = match enumerator.list_all() {
            Ok(all) => all,
            Err(e) => {
                warn!(error = %e, "card enumeration failed");
                return Outcome::Degraded(Vec::new(), e);
            }
        };
        let linked = Self::get_links(store, node);
        linked.map(|linked| {
            all.into_iter()
                .filter(|card| card.id.as_str() != node)
                .map(|card| Candidate {
                    already_linked: linked.contains(&card.id),
                    node: card,
                })
                .collect()
        })
    }

    /// Sanitise the whole stored blob.
    ///
    /// Writes when the value is legacy or malformed, or when decoding had to
    /// repair the map. A canonical string that decodes to a well-formed map
    /// is left as stored, even if its formatting differs from `encode`. An
    /// unparseable value is reset to the empty map.
    pub fn clean<S: KeyValueStore>(store: &AdjacencyStore<S>) -> Outcome<CleanReport> {
        let inspection = match store.inspect() {
            Ok(inspection) => inspection,
            Err(e) => {
                warn!(error = %e, "clean skipped: links read failed");
                return Outcome::Degraded(CleanReport::default(), e);
            }
        };
        let mut report = CleanReport {
            encoding: inspection.encoding,
            rewritten: false,
            nodes: inspection.map.node_count(),
            edges: inspection.map.edge_count(),
        };

        let result = match inspection.encoding {
            Encoding::Absent => return Outcome::Ok(report),
            Encoding::Canonical if !inspection.repaired => return Outcome::Ok(report),
            Encoding::Malformed => store.write_raw(formats::empty_encoding()),
            Encoding::Canonical | Encoding::Legacy => {
                formats::encode(&inspection.map).and_then(|value| store.write_raw(value))
            }
        };

        match result {
            Ok(()) => {
                report.rewritten = true;
                info!(encoding = ?report.encoding, nodes = report.nodes, "cleaned card links data");
                Outcome::Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "clean write failed");
                Outcome::Degraded(report, e)
            }
        }
    }

    /// Counts and shape of the stored blob.
    pub fn stats<S: KeyValueStore>(store: &AdjacencyStore<S>) -> Outcome<LinkStats> {
        Outcome::from_result(store.inspect().map(|inspection| LinkStats {
            encoding: inspection.encoding,
            needs_cleaning: inspection.repaired,
            nodes: inspection.map.node_count(),
            edges: inspection.map.edge_count(),
        }))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Validate the endpoints of an edge; `None` for empty ids or a self link.
fn edge_endpoints(a: &str, b: &str) -> Option<(NodeId, NodeId)> {
    let (Ok(a), Ok(b)) = (NodeId::new(a), NodeId::new(b)) else {
        debug!("link rejected: empty node id");
        return None;
    };
    if a == b {
        debug!(error = %LinkError::SelfLink(a), "link rejected");
        return None;
    }
    Some((a, b))
}

/// One read, apply `change`, one write if it changed anything.
pub(crate) fn mutate<S: KeyValueStore>(
    store: &AdjacencyStore<S>,
    change: impl FnOnce(&mut AdjacencyMap) -> bool,
) -> Outcome<LinkChange> {
    let (mut map, read_error) = store.read_all().into_parts();
    if let Some(cause) = read_error {
        warn!(error = %cause, "mutation skipped: links read failed");
        return Outcome::Degraded(LinkChange::Unchanged, cause);
    }
    if !change(&mut map) {
        return Outcome::Ok(LinkChange::Unchanged);
    }
    match store.write_all(&map) {
        Outcome::Ok(()) => Outcome::Ok(LinkChange::Applied),
        Outcome::Degraded((), cause) => Outcome::Degraded(LinkChange::Unchanged, cause),
    }
}

// =============================================================================
// TESTS
// =============================================================================
