//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the links layer is INVALID.
//!
//! ## Tiers
//! - T0: Link Lifecycle (add, query, remove)
//! - T1: Self-Healing (dangling links to deleted cards)
//! - T2: Stored Shape (legacy and corrupt values)
//! - T3: Degraded Store (failures never cross the board boundary)
//! - T4: Concurrent Surfaces (lost updates stay well formed)

use cardlink_core::{
    Board, Encoding, KeyValueStore, LinkChange, LinkError, MemoryStore, MigrationReport,
    NodeDirectory, NodeFields, NodeId, Outcome, Slot, StoredValue,
};
use serde_json::json;

fn id(s: &str) -> NodeId {
    NodeId::new(s).expect("valid id")
}

fn ids(list: &[&str]) -> Vec<NodeId> {
    list.iter().map(|s| id(s)).collect()
}

fn card(s: &str) -> NodeFields {
    NodeFields::new(id(s), format!("Card {s}"), format!("https://board.example/c/{s}"))
}

// =============================================================================
// TIER T0: LINK LIFECYCLE
// =============================================================================

mod t0_link_lifecycle {
    use super::*;

    /// T0.1: Linking on an empty store is visible from both cards.
    #[test]
    fn link_on_empty_store_is_symmetric() {
        let board = Board::new();

        assert_eq!(board.add_link("c1", "c2"), Outcome::Ok(LinkChange::Applied));

        assert_eq!(board.get_links("c1"), Outcome::Ok(ids(&["c2"])));
        assert_eq!(board.get_links("c2"), Outcome::Ok(ids(&["c1"])));
    }

    /// T0.2: Link then unlink leaves both cards empty.
    #[test]
    fn unlink_clears_both_sides() {
        let board = Board::new();
        let _ = board.add_link("c1", "c2");

        assert_eq!(
            board.remove_link("c1", "c2"),
            Outcome::Ok(LinkChange::Applied)
        );

        assert!(board.get_links("c1").value().is_empty());
        assert!(board.get_links("c2").value().is_empty());
        assert!(board.snapshot().value().is_empty());
    }

    /// T0.3: Self links are rejected and never stored.
    #[test]
    fn self_link_rejected() {
        let board = Board::new();

        assert_eq!(board.add_link("c1", "c1"), Outcome::Ok(LinkChange::Rejected));
        assert!(board.get_links("c1").value().is_empty());
    }

    /// T0.4: Links keep insertion order.
    #[test]
    fn links_keep_insertion_order() {
        let board = Board::new();
        let _ = board.add_link("hub", "z");
        let _ = board.add_link("hub", "a");
        let _ = board.add_link("m", "hub");

        assert_eq!(board.get_links("hub").into_value(), ids(&["z", "a", "m"]));
    }

    /// T0.5: Unknown and empty ids read as unlinked.
    #[test]
    fn unknown_ids_have_no_links() {
        let board = Board::new();
        assert_eq!(board.get_links("nobody"), Outcome::Ok(Vec::new()));
        assert_eq!(board.get_links(""), Outcome::Ok(Vec::new()));
        assert_eq!(board.link_count("nobody"), Outcome::Ok(0));
    }
}

// =============================================================================
// TIER T1: SELF-HEALING
// =============================================================================

mod t1_self_healing {
    use super::*;

    /// T1.1: A seeded asymmetric map is reconciled against the resolver.
    #[test]
    fn asymmetric_seed_reconciled() {
        let slot = Slot::default();
        let raw = MemoryStore::seeded(&slot, json!(r#"{"c1":["c2","c3"]}"#));
        let board = Board::with_memory(raw.clone());
        let cards: NodeDirectory = [card("c1"), card("c2")].into_iter().collect();

        let live = board.reconcile_and_fetch("c1", &cards).into_value();

        assert_eq!(live, vec![card("c2")]);
        assert_eq!(board.get_links("c1").into_value(), ids(&["c2"]));
        assert!(board.get_links("c3").value().is_empty());
        assert!(board.snapshot().value().is_well_formed());
    }

    /// T1.2: Reconciling from the other endpoint also converges.
    #[test]
    fn either_endpoint_converges() {
        let board = Board::new();
        let _ = board.add_link("c1", "c2");
        let _ = board.add_link("c2", "c3");
        let mut cards: NodeDirectory = [card("c1"), card("c2"), card("c3")].into_iter().collect();
        cards.remove(&id("c2"));

        let from_c1 = board.reconcile("c1", &cards).into_value();
        assert_eq!(from_c1.pruned, ids(&["c2"]));
        let from_c3 = board.reconcile("c3", &cards).into_value();
        assert_eq!(from_c3.pruned, ids(&["c2"]));

        assert!(board.snapshot().value().is_empty());
    }

    /// T1.3: Pruning is persisted, not just hidden.
    #[test]
    fn pruning_is_persisted() {
        let raw = MemoryStore::new();
        let panel = Board::with_memory(raw.clone());
        let badge = Board::with_memory(raw);
        let _ = panel.add_link("c1", "gone");
        let cards: NodeDirectory = [card("c1")].into_iter().collect();

        let _ = panel.reconcile_and_fetch("c1", &cards);

        assert_eq!(badge.link_count("c1"), Outcome::Ok(0));
        assert_eq!(badge.link_count("gone"), Outcome::Ok(0));
    }
}

// =============================================================================
// TIER T2: STORED SHAPE
// =============================================================================

mod t2_stored_shape {
    use super::*;

    /// T2.1: A legacy raw object is reset on first access.
    #[test]
    fn legacy_object_reset_on_first_read() {
        let slot = Slot::default();
        let raw = MemoryStore::seeded(&slot, json!({"c1": ["c2"]}));
        let board = Board::with_memory(raw.clone());

        assert!(board.get_links("c1").value().is_empty());

        assert_eq!(
            board.migration(),
            Some(&MigrationReport::Reset(Encoding::Legacy))
        );
        assert_eq!(raw.peek(&slot), Some(json!("{}")));
    }

    /// T2.2: Stored garbage never reaches a caller as an error.
    #[test]
    fn corrupt_canonical_value_repaired() {
        let slot = Slot::default();
        let raw = MemoryStore::seeded(
            &slot,
            json!(r#"{"c1":["c2","c2","",7,"c1"],"c2":"c1","":["c1"]}"#),
        );
        let board = Board::with_memory(raw.clone());

        assert_eq!(board.get_links("c1"), Outcome::Ok(ids(&["c2"])));
        assert_eq!(board.get_links("c2"), Outcome::Ok(ids(&["c1"])));
        assert_eq!(
            raw.peek(&slot),
            Some(json!(r#"{"c1":["c2"],"c2":["c1"]}"#))
        );
    }

    /// T2.3: Later legacy writes are still decoded, without another reset.
    #[test]
    fn guard_runs_once_per_board() {
        let slot = Slot::default();
        let raw = MemoryStore::new();
        let board = Board::with_memory(raw.clone());
        assert_eq!(board.ensure_migrated(), &MigrationReport::Initialized);

        raw.set(&slot, json!({"c1": ["c2"]})).expect("set");

        assert_eq!(board.get_links("c2"), Outcome::Ok(ids(&["c1"])));
        assert_eq!(raw.peek(&slot), Some(json!({"c1": ["c2"]})));
    }

    /// T2.4: The next write after a legacy read is canonical.
    #[test]
    fn writes_are_always_canonical() {
        let slot = Slot::default();
        let raw = MemoryStore::new();
        let board = Board::with_memory(raw.clone());
        let _ = board.ensure_migrated();
        raw.set(&slot, json!({"c1": ["c2"], "c2": ["c1"]})).expect("set");

        let _ = board.add_link("c1", "c3");

        assert_eq!(
            raw.peek(&slot),
            Some(json!(r#"{"c1":["c2","c3"],"c2":["c1"],"c3":["c1"]}"#))
        );
    }

    /// T2.5: Explicit clean reports what it found.
    #[test]
    fn clean_after_external_corruption() {
        let slot = Slot::default();
        let raw = MemoryStore::new();
        let board = Board::with_memory(raw.clone());
        let _ = board.ensure_migrated();
        raw.set(&slot, json!("{\"c1\":[\"c2\"]")).expect("set");

        let report = board.clean().into_value();

        assert_eq!(report.encoding, Encoding::Malformed);
        assert!(report.rewritten);
        assert_eq!(raw.peek(&slot), Some(json!("{}")));
    }
}

// =============================================================================
// TIER T3: DEGRADED STORE
// =============================================================================

mod t3_degraded_store {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A store that can be switched off mid-test.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        reads_down: AtomicBool,
        writes_down: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, slot: &Slot) -> Result<Option<StoredValue>, LinkError> {
            if self.reads_down.load(Ordering::SeqCst) {
                return Err(LinkError::Store("read timeout".into()));
            }
            self.inner.get(slot)
        }

        fn set(&self, slot: &Slot, value: StoredValue) -> Result<(), LinkError> {
            if self.writes_down.load(Ordering::SeqCst) {
                return Err(LinkError::Store("write rejected".into()));
            }
            self.inner.set(slot, value)
        }
    }

    /// T3.1: A failed read is distinguishable from an empty board.
    #[test]
    fn failed_read_is_degraded_empty() {
        let store = FlakyStore::default();
        store.reads_down.store(true, Ordering::SeqCst);
        let board = Board::with_store(&store);

        let links = board.get_links("c1");

        assert!(links.is_degraded());
        assert!(links.value().is_empty());
        assert!(matches!(board.migration(), Some(MigrationReport::Skipped(_))));
    }

    /// T3.2: A mutation after a failed read writes nothing.
    #[test]
    fn failed_read_never_overwrites() {
        let store = FlakyStore::default();
        let board = Board::with_store(&store);
        let _ = board.add_link("c1", "c2");
        store.reads_down.store(true, Ordering::SeqCst);

        let outcome = board.add_link("c3", "c4");

        assert_eq!(
            outcome,
            Outcome::Degraded(LinkChange::Unchanged, LinkError::Store("read timeout".into()))
        );
        store.reads_down.store(false, Ordering::SeqCst);
        assert_eq!(board.get_links("c1"), Outcome::Ok(ids(&["c2"])));
    }

    /// T3.3: A failed write is reported, not raised.
    #[test]
    fn failed_write_is_degraded() {
        let store = FlakyStore::default();
        let board = Board::with_store(&store);
        let _ = board.ensure_migrated();
        store.writes_down.store(true, Ordering::SeqCst);

        let outcome = board.add_link("c1", "c2");

        assert!(outcome.is_degraded());
        assert_eq!(*outcome.value(), LinkChange::Unchanged);
        assert!(board.get_links("c1").value().is_empty());
    }

    /// T3.4: Pruning still returns the live cards when the write fails.
    #[test]
    fn reconcile_survives_failed_write() {
        let store = FlakyStore::default();
        let board = Board::with_store(&store);
        let _ = board.add_link("c1", "c2");
        let _ = board.add_link("c1", "c3");
        store.writes_down.store(true, Ordering::SeqCst);
        let cards: NodeDirectory = [card("c1"), card("c2")].into_iter().collect();

        let outcome = board.reconcile("c1", &cards);

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value().live, vec![card("c2")]);
        assert_eq!(outcome.value().pruned, ids(&["c3"]));
    }

    /// T3.5: A failing enumerator yields an empty picker.
    #[test]
    fn enumerator_failure_degrades() {
        struct NoCards;
        impl cardlink_core::NodeEnumerator for NoCards {
            fn list_all(&self) -> Result<Vec<NodeFields>, LinkError> {
                Err(LinkError::Enumerate("board offline".into()))
            }
        }
        let board = Board::new();

        let outcome = board.candidates("c1", &NoCards);

        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }
}

// =============================================================================
// TIER T4: CONCURRENT SURFACES
// =============================================================================

mod t4_concurrent_surfaces {
    use super::*;
    use cardlink_core::AdjacencyStore;
    use std::thread;

    /// T4.1: Interleaved read-modify-write loses one update (accepted), but
    /// the surviving snapshot is still symmetric.
    #[test]
    fn lost_update_stays_well_formed() {
        let raw = MemoryStore::new();
        let a = AdjacencyStore::new(raw.clone());
        let b = AdjacencyStore::new(raw.clone());

        let mut map_a = a.read_all().into_value();
        let mut map_b = b.read_all().into_value();
        map_a.insert_edge(&id("c1"), &id("c2"));
        map_b.insert_edge(&id("c3"), &id("c4"));
        let _ = a.write_all(&map_a);
        let _ = b.write_all(&map_b);

        let survivor = a.read_all().into_value();
        assert!(survivor.is_well_formed());
        assert!(survivor.contains_edge(&id("c3"), &id("c4")));
        assert!(!survivor.contains_edge(&id("c1"), &id("c2")));
    }

    /// T4.2: Many surfaces racing never produce an asymmetric blob.
    #[test]
    fn racing_surfaces_never_break_symmetry() {
        let raw = MemoryStore::new();

        let handles: Vec<_> = (0..4)
            .map(|surface| {
                let raw = raw.clone();
                thread::spawn(move || {
                    let board = Board::with_memory(raw);
                    for i in 0..25 {
                        let a = format!("s{surface}-{i}");
                        let b = format!("s{surface}-{}", i + 1);
                        let _ = board.add_link(&a, &b);
                        if i % 3 == 0 {
                            let _ = board.remove_link(&a, &b);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("surface thread");
        }

        let board = Board::with_memory(raw);
        let map = board.snapshot().into_value();
        assert!(map.is_well_formed());
        assert!(!board.stats().value().needs_cleaning);
    }
}
