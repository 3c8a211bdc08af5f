//! # Card Directory Files
//!
//! The CLI has no live board to ask whether a card still exists, so
//! `reconcile` and `candidates` read a snapshot of the board's cards from a
//! JSON file:
//!
//! ```json
//! [
//!   {"id": "c1", "name": "Design review", "url": "https://board/c/c1"},
//!   {"id": "c2", "name": "Ship it"}
//! ]
//! ```
//!
//! A card missing from the file resolves as deleted.

use crate::error::AppError;
use cardlink_core::{NodeDirectory, NodeFields};
use std::path::{Path, PathBuf};

/// Maximum card file size (16 MB).
const MAX_DIRECTORY_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Canonicalize `path` and make sure it names a regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Config(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Config(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > max_size {
        return Err(AppError::Config(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Parse a JSON array of cards.
///
/// Empty ids are rejected; a repeated id keeps the last entry.
pub fn parse_directory(json: &str) -> Result<NodeDirectory, AppError> {
    let cards: Vec<NodeFields> = serde_json::from_str(json)
        .map_err(|e| AppError::Config(format!("Invalid card file: {e}")))?;
    Ok(cards.into_iter().collect())
}

/// Read a card directory file.
pub fn load_directory(path: &Path) -> Result<NodeDirectory, AppError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_DIRECTORY_FILE_SIZE)?;
    let content = std::fs::read_to_string(&path)?;
    let directory = parse_directory(&content)?;
    tracing::debug!(cards = directory.len(), path = %path.display(), "loaded card directory");
    Ok(directory)
}
