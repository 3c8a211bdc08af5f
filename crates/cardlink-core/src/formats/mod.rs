//! # Formats Module
//!
//! Stored representation of the links blob.
//! Store I/O lives in `storage`; this module is pure transformation.

pub mod codec;

pub use codec::{Encoding, Inspection, StoredValue, decode, empty_encoding, encode, inspect};
