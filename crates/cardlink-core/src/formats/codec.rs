//! # Links Blob Codec
//!
//! Conversion between the stored links value and an [`AdjacencyMap`].
//!
//! Two physical encodings have existed under the links key:
//! - canonical: a JSON *string* holding an object `{ "<id>": ["<id>", ...] }`
//! - legacy: the same object stored as a raw structured value
//!
//! Decoding accepts both and never fails: anything it cannot use is dropped
//! and the result always satisfies the canonical-form invariants. Encoding
//! always produces the canonical string.

use crate::graph::AdjacencyMap;
use crate::{LinkError, NodeId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Raw value as held by the key-value store.
pub type StoredValue = Value;

// =============================================================================
// ENCODING DETECTION
// =============================================================================

/// Physical shape of a stored links value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Nothing stored (or an explicit null).
    #[default]
    Absent,
    /// A string containing a JSON object.
    Canonical,
    /// A raw structured object.
    Legacy,
    /// Anything else: other JSON types, unparseable or non-object strings.
    Malformed,
}

/// Result of inspecting a raw stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// The decoded, normalised map.
    pub map: AdjacencyMap,
    pub encoding: Encoding,
    /// Normalisation changed the decoded map: an entry or link was dropped,
    /// or a missing reciprocal was added. Formatting of a canonical string
    /// (whitespace, key order) does not count.
    pub repaired: bool,
}

impl Inspection {
    fn empty(encoding: Encoding, repaired: bool) -> Self {
        Self {
            map: AdjacencyMap::new(),
            encoding,
            repaired,
        }
    }
}

/// Classify and decode a raw stored value.
pub fn inspect(raw: Option<&StoredValue>) -> Inspection {
    match raw {
        None | Some(Value::Null) => Inspection::empty(Encoding::Absent, false),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(entries)) => {
                let (map, repaired) = normalise(&entries);
                Inspection {
                    map,
                    encoding: Encoding::Canonical,
                    repaired,
                }
            }
            Ok(_) | Err(_) => Inspection::empty(Encoding::Malformed, true),
        },
        Some(Value::Object(entries)) => {
            let (map, repaired) = normalise(entries);
            Inspection {
                map,
                encoding: Encoding::Legacy,
                repaired,
            }
        }
        Some(_) => Inspection::empty(Encoding::Malformed, true),
    }
}

// =============================================================================
// DECODE / ENCODE
// =============================================================================

/// Decode a stored value into a well-formed map.
///
/// Fails soft: malformed input yields the empty map.
pub fn decode(raw: &StoredValue) -> AdjacencyMap {
    inspect(Some(raw)).map
}

/// Encode a map as the canonical stored value.
pub fn encode(map: &AdjacencyMap) -> Result<StoredValue, LinkError> {
    serde_json::to_string(map)
        .map(Value::String)
        .map_err(|e| LinkError::Encode(e.to_string()))
}

/// The canonical encoding of the empty map.
pub fn empty_encoding() -> StoredValue {
    Value::String(crate::primitives::EMPTY_ENCODING.to_string())
}

// =============================================================================
// NORMALISATION
// =============================================================================

/// Rebuild a map from a decoded JSON object.
///
/// Entries with an empty key or a non-array value are dropped, as are
/// non-string, empty, self and duplicate ids. Missing reciprocal ids are then
/// appended so the result is symmetric. Valid entries keep their order.
fn normalise(entries: &Map<String, Value>) -> (AdjacencyMap, bool) {
    let mut map = AdjacencyMap::new();
    let mut repaired = false;

    for (key, value) in entries {
        let Ok(node) = NodeId::new(key.as_str()) else {
            repaired = true;
            continue;
        };
        let Value::Array(items) = value else {
            repaired = true;
            continue;
        };
        if items.is_empty() {
            repaired = true;
        }
        for item in items {
            match item.as_str().map(NodeId::new) {
                Some(Ok(target)) => repaired |= !map.push_directed(&node, &target),
                _ => repaired = true,
            }
        }
    }

    let mut missing: Vec<(NodeId, NodeId)> = Vec::new();
    for (a, targets) in map.iter() {
        for b in targets {
            if !map.contains_edge(b, a) {
                missing.push((b.clone(), a.clone()));
            }
        }
    }
    for (from, to) in &missing {
        map.push_directed(from, to);
        repaired = true;
    }

    (map, repaired)
}

// =============================================================================
// TESTS
// =============================================================================
