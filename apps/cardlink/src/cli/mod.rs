//! # Cardlink CLI Module
//!
//! This module implements the CLI interface for Cardlink.
//!
//! ## Available Commands
//!
//! - `init` - Create the database with empty links
//! - `status` - Show where the links live and what they contain
//! - `dump` - Print the whole links map
//! - `migrate` - Run the legacy/corruption guard
//! - `clean` - Sanitise the stored links value
//! - `links` - List one card's links
//! - `link` / `unlink` - Add or remove a link between two cards
//! - `reconcile` - Prune links to cards missing from a card file
//! - `candidates` - List the cards a card could be linked to

mod commands;

use crate::config::{Backend, Config};
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Cardlink - linked cards for shared boards
///
/// Inspects and edits the symmetric "linked cards" relation stored in a
/// board's shared key-value slot.
#[derive(Parser, Debug)]
#[command(name = "cardlink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./cardlink.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the links database (overrides store.path)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides store.backend)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new database with empty links
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show link status
    Status,

    /// Print the whole links map
    Dump,

    /// Run the legacy/corruption guard
    Migrate,

    /// Sanitise the stored links value now
    Clean,

    /// List the links of a card
    Links {
        /// Card id
        card: String,
    },

    /// Link two cards
    Link {
        a: String,
        b: String,
    },

    /// Unlink two cards
    Unlink {
        a: String,
        b: String,
    },

    /// Show a card's live links, pruning cards missing from the card file
    Reconcile {
        /// Card id
        card: String,

        /// JSON array of {id, name, url} describing the board's cards
        #[arg(long)]
        cards: PathBuf,
    },

    /// List the cards a card could be linked to
    Candidates {
        /// Card id
        card: String,

        /// JSON array of {id, name, url} describing the board's cards
        #[arg(long)]
        cards: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, mut config: Config) -> Result<(), AppError> {
    config.store.apply_overrides(cli.database, cli.backend);
    let store = &config.store;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(store, force),
        Some(Commands::Status) => cmd_status(store, json_mode),
        Some(Commands::Dump) => cmd_dump(store, json_mode),
        Some(Commands::Migrate) => cmd_migrate(store, json_mode),
        Some(Commands::Clean) => cmd_clean(store, json_mode),
        Some(Commands::Links { card }) => cmd_links(store, json_mode, &card),
        Some(Commands::Link { a, b }) => cmd_link(store, json_mode, &a, &b),
        Some(Commands::Unlink { a, b }) => cmd_unlink(store, json_mode, &a, &b),
        Some(Commands::Reconcile { card, cards }) => {
            cmd_reconcile(store, json_mode, &card, &cards)
        }
        Some(Commands::Candidates { card, cards }) => {
            cmd_candidates(store, json_mode, &card, &cards)
        }
        None => {
            // No subcommand - show status by default
            cmd_status(store, json_mode)
        }
    }
}
