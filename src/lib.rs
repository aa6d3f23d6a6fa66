//! todo-ledger: per-channel to-do lists with a dense priority ranking.
//!
//! Every list keeps its items ranked `1..=N` with no gaps or duplicates.
//! Inserts, moves and deletes shift the neighbouring ranks inside a single
//! SQLite write transaction, so concurrent callers never observe a partial
//! renumbering.
//!
//! # Example
//!
//! ```no_run
//! use todo_ledger::{Status, Store};
//! use std::path::Path;
//!
//! let mut store = Store::open(Path::new("data")).unwrap();
//! let list = store.create_list(1, 10, "groceries").unwrap();
//!
//! let milk = store.add_item(list.id, "Milk", Status::Pending, None).unwrap().unwrap();
//! let eggs = store.add_item(list.id, "Eggs", Status::Pending, Some(1)).unwrap().unwrap();
//! assert_eq!(eggs.priority, 1);
//!
//! // Milk was pushed back to 2; move it to the front again
//! store.move_item(list.id, milk.id, 1).unwrap();
//!
//! let items = store.items(list.id).unwrap();
//! assert_eq!(items[0].name, "Milk");
//! ```

mod ledger;
mod storage;
mod store;
mod types;

pub mod client;
pub mod config;
pub mod daemon;
pub mod protocol;

// Re-export public API
pub use client::Client;
pub use config::Config;
pub use daemon::{Daemon, DaemonConfig, is_daemon_running, start_daemon};
pub use ledger::{DensityReport, Shift, plan_move, resolve_insert_priority, resolve_move_priority};
pub use protocol::{Request, Response};
pub use store::{Store, StoreError};
pub use types::{Item, ItemId, ListId, MAX_NAME_LEN, Status, TodoList, ValidationError, parse_priority, validate_name};
