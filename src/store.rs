//! High-level store API: the repository and the ledger behind one handle.

use crate::ledger::{self, DensityReport};
use crate::storage::{self, DEFAULT_BUSY_TIMEOUT, Storage};
use crate::types::{Item, ItemId, ListId, Status, TodoList, ValidationError, validate_name};
use chrono::Utc;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors that can occur during store operations.
///
/// Missing lists and items are not errors: lookups return `None` and
/// mutations return `None`/`false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreError {
    /// A list with this name already exists in the channel.
    DuplicateListName { channel_id: i64, name: String },
    /// Validation error.
    Validation { error: ValidationError },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateListName { channel_id, name } => {
                write!(f, "list '{}' already exists in channel {}", name, channel_id)
            }
            StoreError::Validation { error: e } => write!(f, "validation error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

fn validate(name: &str) -> Result<()> {
    validate_name(name).map_err(|e| eyre::eyre!(StoreError::Validation { error: e }))
}

/// The to-do store.
pub struct Store {
    storage: Storage,
}

impl Store {
    /// Open the store in the given directory, creating it if needed.
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_with_timeout(root, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open the store with a custom lock wait.
    pub fn open_with_timeout(root: &Path, busy_timeout: Duration) -> Result<Self> {
        let storage = Storage::open(root, busy_timeout)?;
        Ok(Self { storage })
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let storage = Storage::open_in_memory()?;
        Ok(Self { storage })
    }

    /// Database file backing this store, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.storage.path()
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------

    /// Create a list. Fails if the channel already has a list with this name.
    pub fn create_list(&mut self, guild_id: i64, channel_id: i64, name: &str) -> Result<TodoList> {
        validate(name)?;

        let tx = self.storage.transaction()?;
        if storage::find_list_by_name(&tx, channel_id, name)?.is_some() {
            return Err(eyre::eyre!(StoreError::DuplicateListName {
                channel_id,
                name: name.to_string(),
            }));
        }
        let list = storage::insert_list(&tx, guild_id, channel_id, name, Utc::now())?;
        tx.commit().context("Failed to commit new list")?;

        log::info!("Created list {} '{}' in channel {}", list.id, list.name, channel_id);
        Ok(list)
    }

    pub fn find_list(&self, channel_id: i64, name: &str) -> Result<Option<TodoList>> {
        self.storage.find_list_by_name(channel_id, name)
    }

    pub fn get_list(&self, list_id: ListId) -> Result<Option<TodoList>> {
        self.storage.get_list(list_id)
    }

    /// Rename a list. `false` if no list has `old_name`; fails if `new_name`
    /// is taken by another list in the channel.
    pub fn rename_list(&mut self, channel_id: i64, old_name: &str, new_name: &str) -> Result<bool> {
        validate(new_name)?;
        if old_name == new_name {
            return Ok(self.storage.find_list_by_name(channel_id, old_name)?.is_some());
        }

        let tx = self.storage.transaction()?;
        if storage::find_list_by_name(&tx, channel_id, old_name)?.is_none() {
            return Ok(false);
        }
        if storage::find_list_by_name(&tx, channel_id, new_name)?.is_some() {
            return Err(eyre::eyre!(StoreError::DuplicateListName {
                channel_id,
                name: new_name.to_string(),
            }));
        }
        let renamed = storage::rename_list(&tx, channel_id, old_name, new_name)?;
        tx.commit().context("Failed to commit list rename")?;

        Ok(renamed)
    }

    /// Delete a list and all of its items.
    pub fn delete_list(&mut self, channel_id: i64, name: &str) -> Result<bool> {
        let tx = self.storage.transaction()?;
        let deleted = storage::delete_list(&tx, channel_id, name)?;
        tx.commit().context("Failed to commit list deletion")?;

        if deleted {
            log::info!("Deleted list '{}' in channel {}", name, channel_id);
        }
        Ok(deleted)
    }

    /// Lists in a channel, ordered by name.
    pub fn lists(&self, channel_id: i64) -> Result<Vec<TodoList>> {
        self.storage.lists_in_channel(channel_id)
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Items of a list, ordered by priority.
    pub fn items(&self, list_id: ListId) -> Result<Vec<Item>> {
        self.storage.items_ordered(list_id)
    }

    pub fn get_item(&self, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
        self.storage.get_item(list_id, item_id)
    }

    pub fn count_items(&self, list_id: ListId) -> Result<i64> {
        self.storage.count_items(list_id)
    }

    /// Highest priority in the list, 0 if it is empty.
    pub fn max_priority(&self, list_id: ListId) -> Result<i64> {
        self.storage.max_priority(list_id)
    }

    /// Add an item at `priority` (clamped to `[1, max + 1]`), or at the tail
    /// when `priority` is `None`. `None` if the list does not exist.
    pub fn add_item(
        &mut self,
        list_id: ListId,
        name: &str,
        status: Status,
        priority: Option<i64>,
    ) -> Result<Option<Item>> {
        validate(name)?;

        let tx = self.storage.transaction()?;
        if storage::get_list(&tx, list_id)?.is_none() {
            return Ok(None);
        }
        let item = ledger::insert(&tx, list_id, name, status, priority, Utc::now())?;
        tx.commit().context("Failed to commit item insert")?;

        log::debug!("list {}: added item {} at {}", list_id, item.id, item.priority);
        Ok(Some(item))
    }

    /// Move an item to `priority` (clamped to `[1, max]`).
    pub fn move_item(&mut self, list_id: ListId, item_id: ItemId, priority: i64) -> Result<Option<Item>> {
        let tx = self.storage.transaction()?;
        let moved = ledger::move_item(&tx, list_id, item_id, priority)?;
        tx.commit().context("Failed to commit item move")?;
        Ok(moved)
    }

    /// Delete an item and close the gap it leaves.
    pub fn delete_item(&mut self, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
        let tx = self.storage.transaction()?;
        let deleted = ledger::delete(&tx, list_id, item_id)?;
        tx.commit().context("Failed to commit item deletion")?;
        Ok(deleted)
    }

    pub fn rename_item(&mut self, list_id: ListId, item_id: ItemId, name: &str) -> Result<bool> {
        validate(name)?;
        storage::rename_item(self.storage.conn(), list_id, item_id, name)
    }

    pub fn set_status(&mut self, list_id: ListId, item_id: ItemId, status: Status) -> Result<bool> {
        storage::set_item_status(self.storage.conn(), list_id, item_id, status)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Check a list against the density invariant.
    pub fn check(&self, list_id: ListId) -> Result<DensityReport> {
        ledger::check(self.storage.conn(), list_id)
    }

    /// Restore a damaged list to priorities `1..=N`, keeping its order.
    pub fn renumber(&mut self, list_id: ListId) -> Result<usize> {
        let tx = self.storage.transaction()?;
        let changed = ledger::renumber(&tx, list_id)?;
        tx.commit().context("Failed to commit renumber")?;
        Ok(changed)
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}
