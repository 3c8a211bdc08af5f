//! # cardlink
//!
//! Command-line host for `cardlink-core`. Acts as one surface on a board:
//! loads configuration, opens the shared links slot and drives the link
//! operations. The binary in `main.rs` only sets up logging and calls
//! [`cli::execute`].

pub mod cli;
pub mod config;
pub mod directory;
pub mod error;

pub use error::AppError;
