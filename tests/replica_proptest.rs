//! Property-based tests for replicas.

use proptest::prelude::*;
use quire::crdt::Char;
use quire::crdt::Replica;

// =============================================================================
// Test helpers
// =============================================================================

/// Generate a random local edit
#[derive(Clone, Debug)]
enum EditOp {
    Insert { pos_pct: f64, value: char },
    Delete { pos_pct: f64 },
}

fn arbitrary_edit_op() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (0.0..=1.0f64, prop::char::range('a', 'z'))
            .prop_map(|(pos_pct, value)| EditOp::Insert { pos_pct, value }),
        (0.0..=1.0f64).prop_map(|pos_pct| EditOp::Delete { pos_pct }),
    ]
}

/// Apply an edit, returning the inserted node if there was one.
fn apply_edit(replica: &mut Replica<Char>, op: &EditOp) -> Option<Char> {
    let len = replica.len();
    match op {
        EditOp::Insert { pos_pct, value } => {
            let pos = ((*pos_pct * len as f64) as usize).min(len);
            return Some(replica.local_insert(pos, value.to_string()).unwrap());
        }
        EditOp::Delete { pos_pct } => {
            if len > 0 {
                let pos = ((*pos_pct * len as f64) as usize).min(len - 1);
                replica.local_delete(pos).unwrap();
            }
            return None;
        }
    }
}

/// Interleave per-replica outboxes, keeping each outbox in order.
fn interleave(outboxes: &[Vec<Char>], keys: &[u32]) -> Vec<Char> {
    let mut keys = keys.iter().copied();
    let mut scheduled: Vec<(u32, Char)> = Vec::new();
    for outbox in outboxes {
        let mut slots: Vec<u32> = outbox.iter().map(|_| keys.next().unwrap_or(0)).collect();
        slots.sort();
        scheduled.extend(slots.into_iter().zip(outbox.iter().cloned()));
    }
    scheduled.sort_by_key(|(slot, _)| *slot);
    return scheduled.into_iter().map(|(_, node)| node).collect();
}

// =============================================================================
// Local properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// from_json(to_json(r)) reads the same and keeps the clock
    #[test]
    fn json_round_trip(ops in prop::collection::vec(arbitrary_edit_op(), 0..40)) {
        let mut replica = Replica::new(1);
        for op in &ops {
            apply_edit(&mut replica, op);
        }

        let back: Replica<Char> = Replica::from_json(replica.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.read().unwrap(), replica.read().unwrap());
        prop_assert_eq!(back.clock(), replica.clock());
        prop_assert_eq!(back.len(), replica.len());
    }

    /// Inserting at i then deleting i restores the text
    #[test]
    fn insert_then_delete_is_identity(
        ops in prop::collection::vec(arbitrary_edit_op(), 0..30),
        pos_pct in 0.0..=1.0f64,
    ) {
        let mut replica = Replica::new(1);
        for op in &ops {
            apply_edit(&mut replica, op);
        }
        let before = replica.read().unwrap();
        let pos = ((pos_pct * replica.len() as f64) as usize).min(replica.len());

        replica.local_insert(pos, "#").unwrap();
        replica.local_delete(pos).unwrap();
        prop_assert_eq!(replica.read().unwrap(), before);
        replica.list().validate().unwrap();
    }

    /// The clock never falls behind an id in the list
    #[test]
    fn clock_dominates_node_clocks(
        local in prop::collection::vec(arbitrary_edit_op(), 0..30),
        remote in prop::collection::vec(arbitrary_edit_op(), 0..30),
    ) {
        let mut other = Replica::new(2);
        let inserted: Vec<Char> = remote.iter().filter_map(|op| apply_edit(&mut other, op)).collect();

        let mut replica = Replica::new(1);
        for op in &local {
            apply_edit(&mut replica, op);
        }
        for mut node in inserted {
            node.prev = None;
            node.next = None;
            replica.remote_insert(node).unwrap();
            prop_assert!(replica.clock() >= replica.max_node_clock());
        }
    }
}

// =============================================================================
// Convergence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Concurrent typing on three replicas, delivered in any interleaving
    /// that keeps each sender's order, yields the same text
    #[test]
    fn concurrent_typing_converges(
        runs in prop::collection::vec(prop::collection::vec((0.0..=1.0f64, prop::char::range('a', 'z')), 1..8), 3),
        left_keys in prop::collection::vec(any::<u32>(), 24),
        right_keys in prop::collection::vec(any::<u32>(), 24),
    ) {
        let mut outboxes: Vec<Vec<Char>> = Vec::new();
        for (id, run) in runs.iter().enumerate() {
            let mut replica = Replica::new(id as u64 + 1);
            let sent = run
                .iter()
                .filter_map(|(pos_pct, value)| {
                    apply_edit(&mut replica, &EditOp::Insert { pos_pct: *pos_pct, value: *value })
                })
                .collect();
            outboxes.push(sent);
        }

        let mut left = Replica::new(9);
        for node in interleave(&outboxes, &left_keys) {
            left.remote_insert(node).unwrap();
        }
        let mut right = Replica::new(10);
        for node in interleave(&outboxes, &right_keys) {
            right.remote_insert(node).unwrap();
        }

        prop_assert_eq!(left.read().unwrap(), right.read().unwrap());
        prop_assert_eq!(left.len(), outboxes.iter().map(Vec::len).sum::<usize>());
        left.list().validate().unwrap();
        right.list().validate().unwrap();
    }
}
