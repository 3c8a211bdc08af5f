//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Each command opens the board, performs one operation (the board runs the
//! migration guard where it applies) and closes the store again. Degraded results are printed like
//! normal ones (the fallback value) with a warning logged alongside.

use crate::config::{Backend, StoreConfig};
use crate::directory::load_directory;
use crate::error::AppError;
use cardlink_core::{
    Board, LinkChange, MigrationReport, Outcome, RedbStore, StorageBackend,
    formats::empty_encoding,
};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{info, warn};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the configured links slot.
pub fn open_board(store: &StoreConfig) -> Result<Board, AppError> {
    match store.backend {
        Backend::Redb => Ok(Board::with_redb(&store.path, store.slot.clone())?),
        Backend::Memory => Ok(Board::with_slot(
            StorageBackend::default(),
            store.slot.clone(),
        )),
    }
}

/// Split an outcome into its value and a printable cause, logging the cause.
fn settle<T>(outcome: Outcome<T>) -> (T, Option<String>) {
    let (value, cause) = outcome.into_parts();
    if let Some(e) = &cause {
        warn!(error = %e, "store degraded, showing fallback result");
    }
    (value, cause.as_ref().map(ToString::to_string))
}

fn print_json(output: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

fn migration_json(report: &MigrationReport) -> Value {
    match report {
        MigrationReport::Clean => json!({ "result": "clean" }),
        MigrationReport::Initialized => json!({ "result": "initialized" }),
        MigrationReport::Reset(found) => json!({ "result": "reset", "found": found }),
        MigrationReport::Repaired { nodes, edges } => {
            json!({ "result": "repaired", "nodes": nodes, "edges": edges })
        }
        MigrationReport::Skipped(e) => json!({ "result": "skipped", "error": e.to_string() }),
    }
}

fn migration_summary(report: &MigrationReport) -> String {
    match report {
        MigrationReport::Clean => "clean, nothing to do".to_string(),
        MigrationReport::Initialized => "initialized empty links".to_string(),
        MigrationReport::Reset(found) => format!("reset {found:?} value to empty links"),
        MigrationReport::Repaired { nodes, edges } => {
            format!("repaired in place ({nodes} cards, {edges} links)")
        }
        MigrationReport::Skipped(e) => format!("skipped ({e})"),
    }
}

fn change_summary(change: LinkChange) -> &'static str {
    match change {
        LinkChange::Applied => "applied",
        LinkChange::Unchanged => "unchanged",
        LinkChange::Rejected => "rejected (empty id or self link)",
    }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the database and write empty links.
pub fn cmd_init(store: &StoreConfig, force: bool) -> Result<(), AppError> {
    if store.backend == Backend::Redb && store.path.exists() {
        if !force {
            return Err(AppError::Config(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&store.path)?;
        info!(path = %store.path.display(), "removed existing database");
    }

    let board = open_board(store)?;
    board.store().write_raw(empty_encoding())?;
    board.ensure_migrated();

    println!(
        "Initialized empty card links ({}) at {}",
        store.backend.as_str(),
        store.slot.path()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show where the links live and what they contain.
pub fn cmd_status(store: &StoreConfig, json_mode: bool) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (stats, degraded) = settle(board.stats());
    let migration = board.migration();

    if json_mode {
        print_json(&json!({
            "database": store.path.to_string_lossy(),
            "backend": store.backend.as_str(),
            "slot": store.slot.path(),
            "migration": migration.map(migration_json),
            "stats": stats,
            "degraded": degraded,
        }));
        return Ok(());
    }

    println!("Card Links Status");
    println!("=================");
    println!("Database:  {}", store.path.display());
    println!("Backend:   {}", store.backend.as_str());
    println!("Slot:      {}", store.slot.path());
    match migration {
        Some(report) => println!("Migration: {}", migration_summary(report)),
        None => println!("Migration: not run"),
    }
    println!();
    println!("Encoding:  {:?}", stats.encoding);
    println!("Cards:     {}", stats.nodes);
    println!("Links:     {}", stats.edges);
    if stats.needs_cleaning {
        println!("Stored value needs cleaning (run `cardlink clean`)");
    }
    Ok(())
}

// =============================================================================
// DUMP COMMAND
// =============================================================================

/// Print the whole decoded links map.
pub fn cmd_dump(store: &StoreConfig, json_mode: bool) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (map, degraded) = settle(board.snapshot());

    if json_mode {
        print_json(&json!({ "links": map, "degraded": degraded }));
        return Ok(());
    }

    if map.is_empty() {
        println!("No links.");
    }
    for (card, links) in map.iter() {
        let targets: Vec<&str> = links.iter().map(|id| id.as_str()).collect();
        println!("{card}: {}", targets.join(", "));
    }
    Ok(())
}

// =============================================================================
// MIGRATE / CLEAN COMMANDS
// =============================================================================

/// Run the migration guard and report what it did.
pub fn cmd_migrate(store: &StoreConfig, json_mode: bool) -> Result<(), AppError> {
    let board = open_board(store)?;
    let report = board.ensure_migrated();

    if json_mode {
        print_json(&migration_json(report));
    } else {
        println!("Migration: {}", migration_summary(report));
    }
    Ok(())
}

/// Sanitise the stored value now, then compact a redb file that was rewritten.
pub fn cmd_clean(store: &StoreConfig, json_mode: bool) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (report, degraded) = settle(board.clean());
    drop(board);

    if store.backend == Backend::Redb && report.rewritten {
        let mut db = RedbStore::open(&store.path)?;
        db.compact()?;
        info!(path = %store.path.display(), "compacted database");
    }

    if json_mode {
        print_json(&json!({ "clean": report, "degraded": degraded }));
        return Ok(());
    }

    println!("Found:     {:?}", report.encoding);
    println!("Rewritten: {}", report.rewritten);
    println!("Cards:     {}", report.nodes);
    println!("Links:     {}", report.edges);
    Ok(())
}

// =============================================================================
// LINK COMMANDS
// =============================================================================

/// List the links of one card.
pub fn cmd_links(store: &StoreConfig, json_mode: bool, card: &str) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (links, degraded) = settle(board.get_links(card));

    if json_mode {
        print_json(&json!({ "card": card, "links": links, "degraded": degraded }));
        return Ok(());
    }

    if links.is_empty() {
        println!("{card} has no links.");
    }
    for link in &links {
        println!("{link}");
    }
    Ok(())
}

/// Link two cards.
pub fn cmd_link(store: &StoreConfig, json_mode: bool, a: &str, b: &str) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (change, degraded) = settle(board.add_link(a, b));
    report_change(json_mode, "link", a, b, change, degraded);
    Ok(())
}

/// Unlink two cards.
pub fn cmd_unlink(store: &StoreConfig, json_mode: bool, a: &str, b: &str) -> Result<(), AppError> {
    let board = open_board(store)?;
    let (change, degraded) = settle(board.remove_link(a, b));
    report_change(json_mode, "unlink", a, b, change, degraded);
    Ok(())
}

fn report_change(
    json_mode: bool,
    action: &str,
    a: &str,
    b: &str,
    change: LinkChange,
    degraded: Option<String>,
) {
    if json_mode {
        print_json(&json!({
            "action": action,
            "cards": [a, b],
            "change": change,
            "degraded": degraded,
        }));
    } else {
        println!("{action} {a} <-> {b}: {}", change_summary(change));
    }
}

// =============================================================================
// DIRECTORY-BACKED COMMANDS
// =============================================================================

/// Resolve a card's links against a card file, pruning the missing ones.
pub fn cmd_reconcile(
    store: &StoreConfig,
    json_mode: bool,
    card: &str,
    cards_file: &Path,
) -> Result<(), AppError> {
    let directory = load_directory(cards_file)?;
    let board = open_board(store)?;
    let (result, degraded) = settle(board.reconcile(card, &directory));

    if json_mode {
        print_json(&json!({
            "card": card,
            "live": result.live,
            "pruned": result.pruned,
            "degraded": degraded,
        }));
        return Ok(());
    }

    println!("Linked cards of {card}:");
    if result.live.is_empty() {
        println!("  (none)");
    }
    for node in &result.live {
        println!("  {} {} {}", node.id, node.name, node.url);
    }
    if !result.pruned.is_empty() {
        let pruned: Vec<&str> = result.pruned.iter().map(|id| id.as_str()).collect();
        println!("Pruned deleted cards: {}", pruned.join(", "));
    }
    Ok(())
}

/// List the cards `card` could be linked to.
pub fn cmd_candidates(
    store: &StoreConfig,
    json_mode: bool,
    card: &str,
    cards_file: &Path,
) -> Result<(), AppError> {
    let directory = load_directory(cards_file)?;
    let board = open_board(store)?;
    let (candidates, degraded) = settle(board.candidates(card, &directory));

    if json_mode {
        print_json(&json!({
            "card": card,
            "candidates": candidates,
            "degraded": degraded,
        }));
        return Ok(());
    }

    for candidate in &candidates {
        let mark = if candidate.already_linked { "x" } else { " " };
        println!("[{mark}] {} {}", candidate.node.id, candidate.node.name);
    }
    Ok(())
}
