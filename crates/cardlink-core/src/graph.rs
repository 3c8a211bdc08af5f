//! # Adjacency Map
//!
//! In-memory form of the linked-cards relation.
//!
//! The map is undirected: every edge is stored on both endpoints. All
//! mutators keep the canonical form:
//! - symmetry: `b ∈ links(a)` iff `a ∈ links(b)`
//! - no self-loops, no duplicates within a sequence
//! - no empty sequences (a node with no links is absent)
//!
//! Uses `BTreeMap` for deterministic key order; sequence order is insertion
//! order.

use crate::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// INVARIANT VIOLATIONS
// =============================================================================

/// A broken invariant found by [`AdjacencyMap::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    SelfLoop(NodeId),
    Duplicate(NodeId, NodeId),
    MissingReciprocal(NodeId, NodeId),
    EmptySequence(NodeId),
}

// =============================================================================
// ADJACENCY MAP
// =============================================================================

/// Mapping from a card to the ordered sequence of cards linked to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AdjacencyMap {
    edges: BTreeMap<NodeId, Vec<NodeId>>,
}

impl AdjacencyMap {
    /// Create a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links of `node`, empty if the node has none.
    #[must_use]
    pub fn links(&self, node: &NodeId) -> &[NodeId] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn contains_edge(&self, a: &NodeId, b: &NodeId) -> bool {
        self.links(a).contains(b)
    }

    /// Number of nodes with at least one link.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of undirected edges.
    ///
    /// Counts each stored direction once and halves, so an asymmetric entry
    /// (only possible before normalisation) rounds down.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum::<usize>() / 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &[NodeId])> {
        self.edges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Every undirected edge once, as `(smaller, larger)` in key order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(a, targets)| targets.iter().filter(move |b| a < *b).map(move |b| (a, b)))
    }

    /// Link `a` and `b` on both sides.
    ///
    /// Returns `true` if the map changed. Self links are ignored.
    pub fn insert_edge(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if a == b {
            return false;
        }
        let forward = push_unique(self.edges.entry(a.clone()).or_default(), b);
        let backward = push_unique(self.edges.entry(b.clone()).or_default(), a);
        forward || backward
    }

    /// Unlink `a` and `b` on both sides.
    ///
    /// Returns `true` if the map changed. Removing a missing edge is a no-op.
    pub fn remove_edge(&mut self, a: &NodeId, b: &NodeId) -> bool {
        let forward = self.remove_directed(a, b);
        let backward = self.remove_directed(b, a);
        forward || backward
    }

    /// Replace the links of `node` with `targets`, keeping symmetry.
    ///
    /// Reciprocal entries of dropped targets are removed and reciprocal
    /// entries of new targets are added. Self references and duplicates in
    /// `targets` are skipped. Returns `true` if the map changed.
    pub fn replace_links(&mut self, node: &NodeId, targets: &[NodeId]) -> bool {
        let mut changed = false;
        let current = self.links(node).to_vec();
        for old in current.iter().filter(|old| !targets.contains(old)) {
            changed |= self.remove_edge(node, old);
        }
        for target in targets {
            changed |= self.insert_edge(node, target);
        }
        changed
    }

    /// Check every invariant of the canonical form.
    pub fn check(&self) -> Result<(), Violation> {
        for (node, targets) in &self.edges {
            if targets.is_empty() {
                return Err(Violation::EmptySequence(node.clone()));
            }
            for (i, target) in targets.iter().enumerate() {
                if target == node {
                    return Err(Violation::SelfLoop(node.clone()));
                }
                if targets[..i].contains(target) {
                    return Err(Violation::Duplicate(node.clone(), target.clone()));
                }
                if !self.contains_edge(target, node) {
                    return Err(Violation::MissingReciprocal(node.clone(), target.clone()));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.check().is_ok()
    }

    /// Append a single direction without touching the other endpoint.
    ///
    /// Used by the codec while rebuilding a map from stored data; the caller
    /// is responsible for restoring symmetry afterwards.
    pub(crate) fn push_directed(&mut self, from: &NodeId, to: &NodeId) -> bool {
        if from == to {
            return false;
        }
        push_unique(self.edges.entry(from.clone()).or_default(), to)
    }

    fn remove_directed(&mut self, from: &NodeId, to: &NodeId) -> bool {
        let Some(targets) = self.edges.get_mut(from) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|t| t != to);
        let changed = targets.len() != before;
        if targets.is_empty() {
            self.edges.remove(from);
        }
        changed
    }
}

fn push_unique(targets: &mut Vec<NodeId>, id: &NodeId) -> bool {
    if targets.contains(id) {
        return false;
    }
    targets.push(id.clone());
    true
}

// =============================================================================
// TESTS
// =============================================================================
