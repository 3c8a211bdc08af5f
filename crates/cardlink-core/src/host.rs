//! # Host Collaborators
//!
//! Card lookups provided by the host board. The core only consumes them.

use crate::{LinkError, NodeFields, NodeId};
use std::collections::BTreeMap;

/// Looks up a card by id.
///
/// Any `Err` is read by the reconciler as "this card no longer exists",
/// never as a transient failure.
pub trait NodeResolver {
    fn resolve(&self, id: &NodeId) -> Result<NodeFields, LinkError>;
}

/// Lists every card on the board.
pub trait NodeEnumerator {
    fn list_all(&self) -> Result<Vec<NodeFields>, LinkError>;
}

impl<F> NodeResolver for F
where
    F: Fn(&NodeId) -> Result<NodeFields, LinkError>,
{
    fn resolve(&self, id: &NodeId) -> Result<NodeFields, LinkError> {
        self(id)
    }
}

// =============================================================================
// NODE DIRECTORY
// =============================================================================

/// A fixed snapshot of the board's cards, keyed by id.
///
/// Serves as both resolver and enumerator. A card missing from the snapshot
/// resolves as deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDirectory {
    cards: BTreeMap<NodeId, NodeFields>,
}

impl NodeDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a card.
    pub fn insert(&mut self, card: NodeFields) {
        self.cards.insert(card.id.clone(), card);
    }

    /// Drop a card, as if it were deleted from the board.
    pub fn remove(&mut self, id: &NodeId) -> Option<NodeFields> {
        self.cards.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<NodeFields> for NodeDirectory {
    fn from_iter<I: IntoIterator<Item = NodeFields>>(iter: I) -> Self {
        let mut directory = Self::new();
        for card in iter {
            directory.insert(card);
        }
        directory
    }
}

impl NodeResolver for NodeDirectory {
    fn resolve(&self, id: &NodeId) -> Result<NodeFields, LinkError> {
        self.cards
            .get(id)
            .cloned()
            .ok_or_else(|| LinkError::Resolve(id.clone(), "card not found".to_string()))
    }
}

impl NodeEnumerator for NodeDirectory {
    fn list_all(&self) -> Result<Vec<NodeFields>, LinkError> {
        Ok(self.cards.values().cloned().collect())
    }
}
