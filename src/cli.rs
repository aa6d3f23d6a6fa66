//! CLI argument parsing for the to-do ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "todo",
    about = "Per-channel to-do lists with priority ordering",
    version,
    after_help = "Logs are written to: ~/.local/share/todo-ledger/logs/todo-ledger.log"
)]
pub struct Cli {
    /// Store directory (default: from config)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Config file (default: ~/.config/todo-ledger/config.yaml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Guild scope
    #[arg(short = 'g', long, global = true)]
    pub guild: Option<i64>,

    /// Channel scope
    #[arg(short = 'C', long, global = true)]
    pub channel: Option<i64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage lists
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Show all lists in the channel
    Lists,

    /// Manage items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Check a list for gaps or duplicate priorities
    Check {
        /// List name
        list: String,
    },

    /// Renumber a damaged list to 1..N
    Repair {
        /// List name
        list: String,
    },

    /// Run the daemon in foreground
    Daemon,

    /// Stop the running daemon
    DaemonStop,

    /// Check daemon status
    DaemonStatus,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Create a list
    Create { name: String },

    /// Rename a list
    Rename { old_name: String, new_name: String },

    /// Delete a list and all of its items
    Delete { name: String },

    /// Show the items of a list
    Show { name: String },
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add an item (appended when no priority is given)
    Add {
        /// List name
        list: String,

        /// Item name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,

        /// Position to insert at (1 = top)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Rename an item
    Rename {
        list: String,
        id: i64,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Move an item to a new priority
    Move { list: String, id: i64, priority: String },

    /// Set item status (pending, in_progress, done)
    Status { list: String, id: i64, status: String },

    /// Delete an item
    Delete { list: String, id: i64 },
}
