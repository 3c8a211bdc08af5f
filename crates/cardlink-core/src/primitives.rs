//! # Fixed Constants
//!
//! Storage key and encodings shared by every surface on a board.
//! These values are part of the persisted layout and must not change.

/// Key of the board-wide shared slot holding the whole adjacency map.
pub const LINKS_KEY: &str = "card-links";

/// Canonical encoding of the empty adjacency map.
///
/// Written by the migration guard on reset and by `clean` when the stored
/// value cannot be parsed at all.
pub const EMPTY_ENCODING: &str = "{}";
