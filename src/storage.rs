//! Storage layer: SQLite connection, schema and the list/item repository.

use crate::types::{Item, ItemId, ListId, Status, TodoList};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite database file inside the store directory.
pub const DB_FILE: &str = "todo.db";

/// Default time a writer waits for the database lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LIST_COLUMNS: &str = "id, guild_id, channel_id, name, created_at";
const ITEM_COLUMNS: &str = "id, list_id, name, priority, status, created_at";

/// Storage handle owning the database connection.
pub struct Storage {
    path: Option<PathBuf>,
    db: Connection,
}

impl Storage {
    /// Open (creating if needed) the database in the given directory.
    pub fn open(root: &Path, busy_timeout: Duration) -> Result<Self> {
        fs::create_dir_all(root).context("Failed to create store directory")?;

        let db_path = root.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;
        db.busy_timeout(busy_timeout)
            .context("Failed to set busy timeout")?;
        let journal_mode: String = db
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .context("Failed to enable WAL journal")?;
        log::debug!("journal_mode={}", journal_mode);
        db.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;

        let storage = Self {
            path: Some(db_path),
            db,
        };
        storage.init_schema()?;

        log::info!("Opened store at {}", root.display());
        Ok(storage)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        db.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;

        let storage = Self { path: None, db };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Path of the database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.db
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close SQLite database")
    }

    /// Initialize SQLite schema.
    fn init_schema(&self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS lists (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    guild_id INTEGER NOT NULL,
                    channel_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_lists_channel_name ON lists(channel_id, name);

                CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    priority INTEGER NOT NULL CHECK (priority >= 1),
                    status TEXT NOT NULL CHECK (status IN ('pending', 'in_progress', 'done')),
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_items_list_priority ON items(list_id, priority);
            "#,
            )
            .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Begin a write transaction. The write lock is taken immediately so that
    /// everything read inside the transaction stays valid until commit.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.db
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")
    }

    /// Read-only access to the connection.
    pub fn conn(&self) -> &Connection {
        &self.db
    }

    pub fn find_list_by_name(&self, channel_id: i64, name: &str) -> Result<Option<TodoList>> {
        find_list_by_name(&self.db, channel_id, name)
    }

    pub fn get_list(&self, list_id: ListId) -> Result<Option<TodoList>> {
        get_list(&self.db, list_id)
    }

    pub fn lists_in_channel(&self, channel_id: i64) -> Result<Vec<TodoList>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE channel_id = ? ORDER BY name ASC, id ASC"
        ))?;
        let lists = stmt
            .query_map(params![channel_id], row_to_list)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lists)
    }

    pub fn items_ordered(&self, list_id: ListId) -> Result<Vec<Item>> {
        items_ordered(&self.db, list_id)
    }

    pub fn get_item(&self, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
        get_item(&self.db, list_id, item_id)
    }

    pub fn count_items(&self, list_id: ListId) -> Result<i64> {
        let count = self.db.query_row(
            "SELECT COUNT(*) FROM items WHERE list_id = ?",
            params![list_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn max_priority(&self, list_id: ListId) -> Result<i64> {
        max_priority(&self.db, list_id)
    }
}

// Row-level queries shared by the repository and the ledger. They take a plain
// connection so they run unchanged inside a transaction.

pub(crate) fn find_list_by_name(conn: &Connection, channel_id: i64, name: &str) -> Result<Option<TodoList>> {
    let list = conn
        .query_row(
            &format!("SELECT {LIST_COLUMNS} FROM lists WHERE channel_id = ? AND name = ? ORDER BY id LIMIT 1"),
            params![channel_id, name],
            row_to_list,
        )
        .optional()?;
    Ok(list)
}

pub(crate) fn get_list(conn: &Connection, list_id: ListId) -> Result<Option<TodoList>> {
    let list = conn
        .query_row(
            &format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?"),
            params![list_id],
            row_to_list,
        )
        .optional()?;
    Ok(list)
}

pub(crate) fn insert_list(
    conn: &Connection,
    guild_id: i64,
    channel_id: i64,
    name: &str,
    now: DateTime<Utc>,
) -> Result<TodoList> {
    conn.execute(
        "INSERT INTO lists (guild_id, channel_id, name, created_at) VALUES (?, ?, ?, ?)",
        params![guild_id, channel_id, name, now.to_rfc3339()],
    )?;

    Ok(TodoList {
        id: conn.last_insert_rowid(),
        guild_id,
        channel_id,
        name: name.to_string(),
        created_at: now,
    })
}

pub(crate) fn rename_list(conn: &Connection, channel_id: i64, old_name: &str, new_name: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE lists SET name = ? WHERE channel_id = ? AND name = ?",
        params![new_name, channel_id, old_name],
    )?;
    Ok(changed > 0)
}

/// Delete a list by name. Items go with it through the foreign key cascade.
pub(crate) fn delete_list(conn: &Connection, channel_id: i64, name: &str) -> Result<bool> {
    let Some(list) = find_list_by_name(conn, channel_id, name)? else {
        return Ok(false);
    };
    conn.execute("DELETE FROM lists WHERE id = ?", params![list.id])?;
    Ok(true)
}

pub(crate) fn items_ordered(conn: &Connection, list_id: ListId) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE list_id = ? ORDER BY priority ASC, id ASC"
    ))?;
    let items = stmt
        .query_map(params![list_id], row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub(crate) fn get_item(conn: &Connection, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE list_id = ? AND id = ?"),
            params![list_id, item_id],
            row_to_item,
        )
        .optional()?;
    Ok(item)
}

/// Highest priority in the list, 0 when the list is empty.
pub(crate) fn max_priority(conn: &Connection, list_id: ListId) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(priority) FROM items WHERE list_id = ?",
        params![list_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0))
}

pub(crate) fn rename_item(conn: &Connection, list_id: ListId, item_id: ItemId, name: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE items SET name = ? WHERE list_id = ? AND id = ?",
        params![name, list_id, item_id],
    )?;
    Ok(changed > 0)
}

pub(crate) fn set_item_status(conn: &Connection, list_id: ListId, item_id: ItemId, status: Status) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE items SET status = ? WHERE list_id = ? AND id = ?",
        params![status.as_str(), list_id, item_id],
    )?;
    Ok(changed > 0)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_list(row: &rusqlite::Row) -> rusqlite::Result<TodoList> {
    let created_at_str: String = row.get(4)?;

    Ok(TodoList {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        channel_id: row.get(2)?,
        name: row.get(3)?,
        created_at: parse_timestamp(&created_at_str),
    })
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    let status_str: String = row.get(4)?;
    let status = status_str.parse::<Status>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at_str: String = row.get(5)?;

    Ok(Item {
        id: row.get(0)?,
        list_id: row.get(1)?,
        name: row.get(2)?,
        priority: row.get(3)?,
        status,
        created_at: parse_timestamp(&created_at_str),
    })
}
