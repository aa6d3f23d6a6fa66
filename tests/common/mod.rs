//! Shared test infrastructure for integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use tempfile::TempDir;
use todo_ledger::{Item, ItemId, Status, Store, TodoList};

pub const GUILD: i64 = 1;
pub const CHANNEL: i64 = 100;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: Store,
}

impl TestEnv {
    /// Create a new test environment with an opened store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open(temp_dir.path()).expect("Failed to open store");
        Self { temp_dir, store }
    }

    /// Open a second, independent store handle on the same database.
    pub fn reopen(&self) -> Store {
        Store::open(self.temp_dir.path()).expect("Failed to reopen store")
    }

    /// Create a list in the default channel.
    pub fn create_list(&mut self, name: &str) -> TodoList {
        self.store
            .create_list(GUILD, CHANNEL, name)
            .expect("Failed to create list")
    }

    /// Append an item.
    pub fn add(&mut self, list: &TodoList, name: &str) -> Item {
        self.store
            .add_item(list.id, name, Status::Pending, None)
            .expect("Failed to add item")
            .expect("List not found")
    }

    /// Insert an item at a requested priority.
    pub fn add_at(&mut self, list: &TodoList, name: &str, priority: i64) -> Item {
        self.store
            .add_item(list.id, name, Status::Pending, Some(priority))
            .expect("Failed to add item")
            .expect("List not found")
    }

    /// Move an item, asserting that it exists.
    pub fn move_to(&mut self, list: &TodoList, item: &Item, priority: i64) -> Item {
        self.store
            .move_item(list.id, item.id, priority)
            .expect("Failed to move item")
            .expect("Item not found")
    }

    /// Delete an item, asserting that it exists.
    pub fn delete(&mut self, list: &TodoList, item: &Item) {
        self.store
            .delete_item(list.id, item.id)
            .expect("Failed to delete item")
            .expect("Item not found");
    }

    /// `(name, priority)` pairs in priority order.
    pub fn ranking(&self, list: &TodoList) -> Vec<(String, i64)> {
        self.store
            .items(list.id)
            .expect("Failed to load items")
            .into_iter()
            .map(|i| (i.name, i.priority))
            .collect()
    }

    /// Item ids in priority order.
    pub fn order(&self, list: &TodoList) -> Vec<ItemId> {
        self.store
            .items(list.id)
            .expect("Failed to load items")
            .into_iter()
            .map(|i| i.id)
            .collect()
    }

    /// Priority of a single item.
    pub fn priority_of(&self, list: &TodoList, item: &Item) -> i64 {
        self.store
            .get_item(list.id, item.id)
            .expect("Failed to get item")
            .expect("Item not found")
            .priority
    }

    /// Assert that the list's priorities are exactly 1..=N.
    pub fn assert_dense(&self, list: &TodoList) {
        assert_dense(&self.store, list.id);
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that the list's priorities are exactly 1..=N, in both the stored
/// rows and the density report.
pub fn assert_dense(store: &Store, list_id: i64) {
    let priorities: Vec<i64> = store
        .items(list_id)
        .expect("Failed to load items")
        .iter()
        .map(|i| i.priority)
        .collect();
    let expected: Vec<i64> = (1..=priorities.len() as i64).collect();
    assert_eq!(priorities, expected, "priorities are not dense");

    let report = store.check(list_id).expect("Failed to check list");
    assert!(report.is_dense(), "density report: {:?}", report);
    assert_eq!(store.max_priority(list_id).unwrap(), priorities.len() as i64);
    assert_eq!(store.count_items(list_id).unwrap(), priorities.len() as i64);
}

/// Names as owned `(name, priority)` pairs, for comparisons.
pub fn ranked(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs.iter().map(|(n, p)| (n.to_string(), *p)).collect()
}
