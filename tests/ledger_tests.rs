//! Integration tests for the ordered ledger.
//!
//! Tests insert/move/delete ranking behavior and the density invariant.

mod common;

use common::{TestEnv, ranked};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use todo_ledger::{ItemId, Status};

// =============================================================================
// Insert
// =============================================================================

#[test]
fn test_insert_into_empty_list_gets_priority_one() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");

    let item = env.add(&list, "A");
    assert_eq!(item.priority, 1);
    env.assert_dense(&list);
}

#[test]
fn test_insert_without_priority_appends() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");

    for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
        let item = env.add(&list, name);
        assert_eq!(item.priority, i as i64 + 1);
    }
    env.assert_dense(&list);
}

#[test]
fn test_insert_clamps_low_priority_to_one() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");

    let zero = env.add_at(&list, "zero", 0);
    assert_eq!(zero.priority, 1);
    let negative = env.add_at(&list, "negative", -5);
    assert_eq!(negative.priority, 1);

    assert_eq!(
        env.ranking(&list),
        ranked(&[("negative", 1), ("zero", 2), ("A", 3)])
    );
}

#[test]
fn test_insert_clamps_high_priority_to_tail() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    env.add(&list, "B");

    let far = env.add_at(&list, "far", 50);
    assert_eq!(far.priority, 3);
    let tail = env.add_at(&list, "tail", 4);
    assert_eq!(tail.priority, 4);
    env.assert_dense(&list);
}

#[test]
fn test_insert_in_middle_opens_gap() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    env.add(&list, "B");
    env.add(&list, "C");

    env.add_at(&list, "X", 2);
    assert_eq!(
        env.ranking(&list),
        ranked(&[("A", 1), ("X", 2), ("B", 3), ("C", 4)])
    );
}

#[test]
fn test_insert_keeps_requested_status() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");

    let item = env
        .store
        .add_item(list.id, "A", Status::InProgress, None)
        .unwrap()
        .unwrap();
    assert_eq!(item.status, Status::InProgress);
    assert_eq!(
        env.store.get_item(list.id, item.id).unwrap().unwrap().status,
        Status::InProgress
    );
}

// =============================================================================
// Move
// =============================================================================

#[test]
fn test_move_to_same_priority_is_noop() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    let b = env.add(&list, "B");
    env.add(&list, "C");
    let before = env.ranking(&list);

    let moved = env.move_to(&list, &b, 2);
    assert_eq!(moved.priority, 2);
    assert_eq!(env.ranking(&list), before);
}

#[test]
fn test_move_up_pushes_range_back() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    env.add(&list, "B");
    env.add(&list, "C");
    let d = env.add(&list, "D");
    env.add(&list, "E");

    env.move_to(&list, &d, 2);
    assert_eq!(
        env.ranking(&list),
        ranked(&[("A", 1), ("D", 2), ("B", 3), ("C", 4), ("E", 5)])
    );
}

#[test]
fn test_move_down_pulls_range_forward() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    let b = env.add(&list, "B");
    env.add(&list, "C");
    env.add(&list, "D");
    env.add(&list, "E");

    env.move_to(&list, &b, 4);
    assert_eq!(
        env.ranking(&list),
        ranked(&[("A", 1), ("C", 2), ("D", 3), ("B", 4), ("E", 5)])
    );
}

#[test]
fn test_move_clamps_to_current_max() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    let a = env.add(&list, "A");
    env.add(&list, "B");
    env.add(&list, "C");

    // max + 1 is not a valid move target
    let moved = env.move_to(&list, &a, 4);
    assert_eq!(moved.priority, 3);
    let moved = env.move_to(&list, &a, 1000);
    assert_eq!(moved.priority, 3);
    assert_eq!(env.ranking(&list), ranked(&[("B", 1), ("C", 2), ("A", 3)]));
}

#[test]
fn test_move_clamps_low_to_one() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    let b = env.add(&list, "B");

    let moved = env.move_to(&list, &b, -3);
    assert_eq!(moved.priority, 1);
    assert_eq!(env.ranking(&list), ranked(&[("B", 1), ("A", 2)]));
}

#[test]
fn test_move_single_item_list() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    let a = env.add(&list, "A");

    assert_eq!(env.move_to(&list, &a, 7).priority, 1);
    env.assert_dense(&list);
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_closes_gap() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    let items: Vec<_> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|n| env.add(&list, n))
        .collect();

    env.delete(&list, &items[2]);

    // Only items above the deleted priority moved, each by exactly one
    assert_eq!(env.priority_of(&list, &items[0]), 1);
    assert_eq!(env.priority_of(&list, &items[1]), 2);
    assert_eq!(env.priority_of(&list, &items[3]), 3);
    assert_eq!(env.priority_of(&list, &items[4]), 4);
    env.assert_dense(&list);
}

#[test]
fn test_delete_last_item_leaves_others() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    env.add(&list, "B");
    let c = env.add(&list, "C");

    env.delete(&list, &c);
    assert_eq!(env.ranking(&list), ranked(&[("A", 1), ("B", 2)]));
}

#[test]
fn test_delete_only_item_empties_list() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    let a = env.add(&list, "A");

    env.delete(&list, &a);
    assert!(env.ranking(&list).is_empty());
    assert_eq!(env.store.max_priority(list.id).unwrap(), 0);

    // Next append starts again at one
    assert_eq!(env.add(&list, "B").priority, 1);
}

// =============================================================================
// Scenario
// =============================================================================

#[test]
fn test_insert_move_delete_scenario() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");

    let a = env.add(&list, "A");
    assert_eq!(a.priority, 1);
    let b = env.add(&list, "B");
    assert_eq!(b.priority, 2);

    let c = env.add_at(&list, "C", 1);
    assert_eq!(c.priority, 1);
    assert_eq!(env.ranking(&list), ranked(&[("C", 1), ("A", 2), ("B", 3)]));

    env.move_to(&list, &c, 3);
    assert_eq!(env.ranking(&list), ranked(&[("A", 1), ("B", 2), ("C", 3)]));

    env.delete(&list, &a);
    assert_eq!(env.ranking(&list), ranked(&[("B", 1), ("C", 2)]));
}

// =============================================================================
// Not Found
// =============================================================================

#[test]
fn test_missing_item_reports_not_found_and_changes_nothing() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    env.add(&list, "B");
    let before = env.ranking(&list);

    assert!(env.store.move_item(list.id, 9999, 1).unwrap().is_none());
    assert!(env.store.delete_item(list.id, 9999).unwrap().is_none());
    assert!(!env.store.rename_item(list.id, 9999, "Z").unwrap());
    assert!(!env.store.set_status(list.id, 9999, Status::Done).unwrap());

    assert_eq!(env.ranking(&list), before);
}

#[test]
fn test_rename_and_status_do_not_touch_order() {
    let mut env = TestEnv::new();
    let list = env.create_list("chores");
    env.add(&list, "A");
    let b = env.add(&list, "B");

    assert!(env.store.rename_item(list.id, b.id, "Bee").unwrap());
    assert!(env.store.set_status(list.id, b.id, Status::Done).unwrap());

    let item = env.store.get_item(list.id, b.id).unwrap().unwrap();
    assert_eq!(item.name, "Bee");
    assert_eq!(item.status, Status::Done);
    assert_eq!(env.ranking(&list), ranked(&[("A", 1), ("Bee", 2)]));
}

// =============================================================================
// List Isolation
// =============================================================================

#[test]
fn test_lists_rank_independently() {
    let mut env = TestEnv::new();
    let one = env.create_list("one");
    let two = env.create_list("two");

    env.add(&one, "A");
    env.add(&one, "B");
    let x = env.add(&two, "X");
    assert_eq!(x.priority, 1);

    env.add_at(&two, "Y", 1);
    env.delete(&two, &x);

    assert_eq!(env.ranking(&one), ranked(&[("A", 1), ("B", 2)]));
    assert_eq!(env.ranking(&two), ranked(&[("Y", 1)]));
}

// =============================================================================
// Randomized Sequences
// =============================================================================

#[test]
fn test_random_operations_match_model() {
    let mut env = TestEnv::new();
    let list = env.create_list("fuzz");
    let mut rng = StdRng::seed_from_u64(0x5eed);

    // Item ids in rank order
    let mut model: Vec<ItemId> = Vec::new();

    for step in 0..400 {
        let len = model.len() as i64;
        match rng.random_range(0..4) {
            0 | 1 => {
                let requested = if rng.random_bool(0.3) {
                    None
                } else {
                    Some(rng.random_range(-2..=len + 3))
                };
                let item = env
                    .store
                    .add_item(list.id, &format!("item {}", step), Status::Pending, requested)
                    .unwrap()
                    .unwrap();
                let target = requested.unwrap_or(len + 1).clamp(1, len + 1);
                assert_eq!(item.priority, target);
                model.insert((target - 1) as usize, item.id);
            }
            2 if !model.is_empty() => {
                let idx = rng.random_range(0..model.len());
                let id = model[idx];
                let requested = rng.random_range(-2..=len + 3);
                let moved = env.store.move_item(list.id, id, requested).unwrap().unwrap();
                let target = requested.clamp(1, len);
                assert_eq!(moved.priority, target);
                model.remove(idx);
                model.insert((target - 1) as usize, id);
            }
            3 if !model.is_empty() => {
                let idx = rng.random_range(0..model.len());
                let id = model.remove(idx);
                let deleted = env.store.delete_item(list.id, id).unwrap().unwrap();
                assert_eq!(deleted.priority, idx as i64 + 1);
            }
            _ => {}
        }

        assert_eq!(env.order(&list), model, "diverged at step {}", step);
        env.assert_dense(&list);
    }
}
