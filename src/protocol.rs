//! IPC protocol types for daemon communication.

use crate::store::StoreError;
use crate::types::{Item, ItemId, ListId, Status, TodoList};
use serde::{Deserialize, Serialize};

/// Request sent from client to daemon. Scope (guild, channel) is resolved by
/// the caller and passed explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Create a list in a channel.
    CreateList {
        guild_id: i64,
        channel_id: i64,
        name: String,
    },

    /// Rename a list.
    RenameList {
        channel_id: i64,
        old_name: String,
        new_name: String,
    },

    /// Delete a list and its items.
    DeleteList { channel_id: i64, name: String },

    /// Look up a list by name.
    FindList { channel_id: i64, name: String },

    /// Lists in a channel.
    Lists { channel_id: i64 },

    /// Add an item, at the tail when `priority` is omitted.
    AddItem {
        list_id: ListId,
        name: String,
        #[serde(default)]
        status: Status,
        priority: Option<i64>,
    },

    /// Move an item to a new priority.
    MoveItem {
        list_id: ListId,
        item_id: ItemId,
        priority: i64,
    },

    /// Delete an item.
    DeleteItem { list_id: ListId, item_id: ItemId },

    /// Rename an item.
    RenameItem {
        list_id: ListId,
        item_id: ItemId,
        name: String,
    },

    /// Set item status.
    SetStatus {
        list_id: ListId,
        item_id: ItemId,
        status: Status,
    },

    /// Items of a list in priority order.
    Items { list_id: ListId },

    /// Shutdown the daemon.
    Shutdown,

    /// Ping to check if daemon is alive.
    Ping,
}

/// Response sent from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    List { list: TodoList },

    Lists { lists: Vec<TodoList> },

    Item { item: Item },

    Items { items: Vec<Item> },

    /// Referenced list or item does not exist in the given scope.
    NotFound,

    /// Operation succeeded.
    Ok,

    /// Pong response to ping.
    Pong,

    /// The store refused the request; carries the typed reason.
    Rejected { error: StoreError },

    /// Error response.
    Error { message: String },
}

impl Response {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
