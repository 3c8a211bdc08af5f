//! # Core Type Definitions
//!
//! This module contains the shared types of the link-graph layer:
//! - Card identifiers (`NodeId`) and resolved display records (`NodeFields`)
//! - Storage addressing (`Scope`, `Visibility`, `Slot`)
//! - Error types (`LinkError`)
//! - The fail-soft result type (`Outcome`) and mutation status (`LinkChange`)
//!
//! ## Identifier Guarantees
//!
//! A `NodeId` can only be built from a non-empty string, whether it comes
//! from a caller, from serde, or from the stored blob.

use crate::primitives;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque identifier of a card on the board.
///
/// The only structural guarantee is non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Build a node id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, LinkError> {
        let id = id.into();
        if id.is_empty() {
            return Err(LinkError::InvalidNodeId);
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = LinkError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// RESOLVED NODES
// =============================================================================

/// Display fields of a card that still exists on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NodeFields {
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A linked card confirmed live by the resolver.
pub type LiveNode = NodeFields;

/// An entry of the "add link" picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub node: NodeFields,
    /// The card is already linked to the node the picker was opened for.
    pub already_linked: bool,
}

// =============================================================================
// STORAGE ADDRESSING
// =============================================================================

/// Who a stored value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Board,
    Card,
    Member,
}

/// Who can read a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Shared,
    Private,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Card => "card",
            Self::Member => "member",
        }
    }
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }
}

/// Address of one value in the shared key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub scope: Scope,
    pub visibility: Visibility,
    pub key: String,
}

impl Slot {
    #[must_use]
    pub fn new(scope: Scope, visibility: Visibility, key: impl Into<String>) -> Self {
        Self {
            scope,
            visibility,
            key: key.into(),
        }
    }

    /// Flat `scope/visibility/key` form, used as the storage key.
    #[must_use]
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.scope.as_str(),
            self.visibility.as_str(),
            self.key
        )
    }
}

impl Default for Slot {
    /// The board-wide shared slot holding the links blob.
    fn default() -> Self {
        Self::new(Scope::Board, Visibility::Shared, primitives::LINKS_KEY)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced inside the link-graph layer.
///
/// None of these cross the `Board` boundary as `Err`: they are carried as the
/// cause of an `Outcome::Degraded`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A node id was empty.
    #[error("Invalid node id: ids must be non-empty")]
    InvalidNodeId,

    /// A node cannot be linked to itself.
    #[error("Self link rejected: {0}")]
    SelfLink(NodeId),

    /// The key-value store failed to read or write.
    #[error("Store error: {0}")]
    Store(String),

    /// The stored value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The map could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A node could not be resolved (treated as deleted).
    #[error("Node {0} could not be resolved: {1}")]
    Resolve(NodeId, String),

    /// The board's nodes could not be listed.
    #[error("Enumeration failed: {0}")]
    Enumerate(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Best-effort result of a board operation.
///
/// `Degraded` still carries a usable value (the rendering default), so a
/// display surface can always show something while tests and logs can tell
/// "empty" apart from "failed".
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Ok(T),
    Degraded(T, LinkError),
}

impl<T> Outcome<T> {
    /// Borrow the carried value regardless of degradation.
    pub fn value(&self) -> &T {
        match self {
            Self::Ok(v) | Self::Degraded(v, _) => v,
        }
    }

    /// Take the carried value regardless of degradation.
    pub fn into_value(self) -> T {
        match self {
            Self::Ok(v) | Self::Degraded(v, _) => v,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    /// The failure behind a degraded outcome.
    pub fn cause(&self) -> Option<&LinkError> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded(_, cause) => Some(cause),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Degraded(v, cause) => Outcome::Degraded(f(v), cause),
        }
    }

    /// Split into the value and the optional cause.
    pub fn into_parts(self) -> (T, Option<LinkError>) {
        match self {
            Self::Ok(v) => (v, None),
            Self::Degraded(v, cause) => (v, Some(cause)),
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Degrade to `T::default()` on error.
    pub fn from_result(result: Result<T, LinkError>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Degraded(T::default(), e),
        }
    }
}

// =============================================================================
// MUTATION STATUS
// =============================================================================

/// What a mutating call did to the stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkChange {
    /// The new map was written.
    Applied,
    /// The edge was already in the requested state; nothing was written.
    #[default]
    Unchanged,
    /// Invalid input (self link or empty id); nothing was read or written.
    Rejected,
}

// =============================================================================
// TESTS
// =============================================================================
