//! # Existence Reconciler
//!
//! Lazy self-healing of dangling links.
//!
//! Cards can be deleted on the board without the links blob hearing about
//! it. Whenever a card's links are fetched for display, each linked id is
//! resolved through the host; an id that fails to resolve is treated as
//! deleted and pruned from the blob. Pruning is symmetric: the dead id leaves
//! the queried card's sequence and the queried card leaves the dead id's
//! sequence, so no reciprocal lookup sees a half-removed edge.
//!
//! There is no background sweep. This path is the only one that removes
//! edges pointing at deleted cards.

use crate::accessor::AdjacencyStore;
use crate::engine::mutate;
use crate::host::NodeResolver;
use crate::storage::KeyValueStore;
use crate::{LinkChange, LiveNode, NodeId, Outcome};
use serde::Serialize;
use tracing::{debug, info};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Reconciliation {
    /// Linked cards that resolved, in stored order.
    pub live: Vec<LiveNode>,
    /// Linked ids that failed to resolve and were pruned.
    pub pruned: Vec<NodeId>,
}

/// Resolves and prunes the links of one card at a time.
pub struct Reconciler;

impl Reconciler {
    /// Resolve every link of `node` and prune the ones that no longer exist.
    ///
    /// Resolution failures never abort the batch. If anything was pruned,
    /// the blob is re-read, pruned and written once. A degraded read or
    /// write is reported as `Degraded` with the live cards found so far.
    pub fn reconcile<S: KeyValueStore, R: NodeResolver + ?Sized>(
        store: &AdjacencyStore<S>,
        node: &str,
        resolver: &R,
    ) -> Outcome<Reconciliation> {
        let Ok(node) = NodeId::new(node) else {
            return Outcome::Ok(Reconciliation::default());
        };
        let (map, read_error) = store.read_all().into_parts();
        if let Some(cause) = read_error {
            return Outcome::Degraded(Reconciliation::default(), cause);
        }

        let mut result = Reconciliation::default();
        for id in map.links(&node) {
            match resolver.resolve(id) {
                Ok(fields) => result.live.push(fields),
                Err(e) => {
                    debug!(%node, %id, error = %e, "linked card did not resolve");
                    result.pruned.push(id.clone());
                }
            }
        }
        if result.pruned.is_empty() {
            return Outcome::Ok(result);
        }

        // Resolution took time; prune against a fresh read to keep the
        // window for overwriting another surface's change short.
        let write = mutate(store, |map| {
            let mut changed = false;
            for dead in &result.pruned {
                changed |= map.remove_edge(&node, dead);
            }
            changed
        });
        match write {
            Outcome::Ok(change) => {
                if change == LinkChange::Applied {
                    info!(%node, pruned = result.pruned.len(), "pruned links to deleted cards");
                }
                Outcome::Ok(result)
            }
            Outcome::Degraded(_, cause) => Outcome::Degraded(result, cause),
        }
    }

    /// The live linked cards of `node`, pruning dead links on the way.
    pub fn reconcile_and_fetch<S: KeyValueStore, R: NodeResolver + ?Sized>(
        store: &AdjacencyStore<S>,
        node: &str,
        resolver: &R,
    ) -> Outcome<Vec<LiveNode>> {
        Self::reconcile(store, node, resolver).map(|r| r.live)
    }
}
