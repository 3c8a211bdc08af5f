//! Application-wide error types.
//!
//! The core never returns `Err` from board operations; these cover the
//! process-level failures around them.

use cardlink_core::LinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("unknown backend".into());
        assert!(e.to_string().contains("unknown backend"));
    }

    #[test]
    fn link_error_converts() {
        let e: AppError = LinkError::InvalidNodeId.into();
        assert!(e.to_string().starts_with("link error"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
