//! todo CLI - per-channel to-do lists with priority ordering.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use todo_ledger::{
    Client, Config, Daemon, DaemonConfig, Item, Status, Store, TodoList, is_daemon_running, parse_priority,
};

mod cli;

use cli::{Cli, Command, ItemAction, ListAction};

fn setup_logging() -> Result<()> {
    let log_dir = todo_ledger::config::log_dir();

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("todo-ledger.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Resolved invocation scope: where the store lives and which channel we act in.
struct Scope {
    root: PathBuf,
    guild_id: i64,
    channel_id: i64,
    config: Config,
}

impl Scope {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
        Ok(Self {
            root: cli.dir.clone().unwrap_or_else(|| config.data_dir.clone()),
            guild_id: cli.guild.unwrap_or(config.guild_id),
            channel_id: cli.channel.unwrap_or(config.channel_id),
            config,
        })
    }

    fn open_store(&self) -> Result<Store> {
        Store::open_with_timeout(&self.root, self.config.busy_timeout()).context("Failed to open store")
    }
}

fn format_status(status: Status) -> ColoredString {
    match status {
        Status::Pending => "pending".red(),
        Status::InProgress => "in_progress".yellow(),
        Status::Done => "done".green(),
    }
}

fn format_item(item: &Item) -> String {
    format!(
        "{:>3}. {} {} {}",
        item.priority,
        item.status.marker(),
        item.name.bold(),
        format!("(id {})", item.id).dimmed()
    )
}

fn format_list(list: &TodoList, count: i64) -> String {
    format!(
        "  {} {} {} items",
        list.name.cyan(),
        format!("(id {})", list.id).dimmed(),
        count
    )
}

fn not_found(what: &str) -> ! {
    eprintln!("{} {} not found", "✗".red(), what);
    std::process::exit(1);
}

fn require_list(store: &Store, scope: &Scope, name: &str) -> Result<TodoList> {
    match store.find_list(scope.channel_id, name).context("Failed to look up list")? {
        Some(list) => Ok(list),
        None => not_found(&format!("List '{}'", name)),
    }
}

fn run_list(action: ListAction, scope: &Scope) -> Result<()> {
    let mut store = scope.open_store()?;

    match action {
        ListAction::Create { name } => {
            let list = store
                .create_list(scope.guild_id, scope.channel_id, &name)
                .context("Failed to create list")?;
            println!("{} Created list {} (id {})", "✓".green(), list.name.cyan(), list.id);
        }

        ListAction::Rename { old_name, new_name } => {
            if !store
                .rename_list(scope.channel_id, &old_name, &new_name)
                .context("Failed to rename list")?
            {
                not_found(&format!("List '{}'", old_name));
            }
            println!("{} Renamed {} to {}", "✓".green(), old_name.cyan(), new_name.cyan());
        }

        ListAction::Delete { name } => {
            if !store
                .delete_list(scope.channel_id, &name)
                .context("Failed to delete list")?
            {
                not_found(&format!("List '{}'", name));
            }
            println!("{} Deleted list {}", "✓".green(), name.cyan());
        }

        ListAction::Show { name } => {
            let list = require_list(&store, scope, &name)?;
            let items = store.items(list.id).context("Failed to load items")?;

            println!("{} {}", "List:".bold(), list.name.cyan());
            if items.is_empty() {
                println!("{}", "No items".dimmed());
            } else {
                for item in &items {
                    println!("{}", format_item(item));
                }
            }
        }
    }

    store.close()
}

fn run_item(action: ItemAction, scope: &Scope) -> Result<()> {
    let mut store = scope.open_store()?;

    match action {
        ItemAction::Add { list, name, priority } => {
            let priority = priority.as_deref().map(parse_priority).transpose()?;
            let list = require_list(&store, scope, &list)?;
            let name = name.join(" ");

            match store
                .add_item(list.id, &name, Status::Pending, priority)
                .context("Failed to add item")?
            {
                Some(item) => println!(
                    "{} Added {} at priority {} (id {})",
                    "✓".green(),
                    item.name.bold(),
                    item.priority,
                    item.id
                ),
                None => not_found(&format!("List '{}'", list.name)),
            }
        }

        ItemAction::Rename { list, id, name } => {
            let list = require_list(&store, scope, &list)?;
            if !store
                .rename_item(list.id, id, &name.join(" "))
                .context("Failed to rename item")?
            {
                not_found(&format!("Item {}", id));
            }
            println!("{} Renamed item {}", "✓".green(), id);
        }

        ItemAction::Move { list, id, priority } => {
            let priority = parse_priority(&priority)?;
            let list = require_list(&store, scope, &list)?;
            match store.move_item(list.id, id, priority).context("Failed to move item")? {
                Some(item) => println!("{} Item {} is now at priority {}", "✓".green(), id, item.priority),
                None => not_found(&format!("Item {}", id)),
            }
        }

        ItemAction::Status { list, id, status } => {
            let status: Status = status.parse()?;
            let list = require_list(&store, scope, &list)?;
            if !store.set_status(list.id, id, status).context("Failed to set status")? {
                not_found(&format!("Item {}", id));
            }
            println!("{} Item {} is {} {}", "✓".green(), id, format_status(status), status.marker());
        }

        ItemAction::Delete { list, id } => {
            let list = require_list(&store, scope, &list)?;
            match store.delete_item(list.id, id).context("Failed to delete item")? {
                Some(item) => println!("{} Deleted {} (id {})", "✓".green(), item.name.bold(), id),
                None => not_found(&format!("Item {}", id)),
            }
        }
    }

    store.close()
}

fn run(cli: Cli) -> Result<()> {
    let scope = Scope::resolve(&cli)?;

    match cli.command {
        Command::List { action } => run_list(action, &scope)?,

        Command::Item { action } => run_item(action, &scope)?,

        Command::Lists => {
            let store = scope.open_store()?;
            let lists = store.lists(scope.channel_id).context("Failed to list lists")?;

            if lists.is_empty() {
                println!("{}", "No lists in this channel".dimmed());
            } else {
                for list in lists {
                    let count = store.count_items(list.id)?;
                    println!("{}", format_list(&list, count));
                }
            }
            store.close()?;
        }

        Command::Check { list } => {
            let store = scope.open_store()?;
            let list = require_list(&store, &scope, &list)?;
            let report = store.check(list.id).context("Failed to check list")?;

            if report.is_dense() {
                println!("{} {} items ranked 1..{}", "✓".green(), report.count, report.count);
            } else {
                println!("{} List {} is not dense", "✗".red(), list.name.cyan());
                if !report.missing.is_empty() {
                    println!("  missing: {:?}", report.missing);
                }
                if !report.duplicated.is_empty() {
                    println!("  duplicated: {:?}", report.duplicated);
                }
                if !report.out_of_range.is_empty() {
                    println!("  out of range: {:?}", report.out_of_range);
                }
            }
            store.close()?;
        }

        Command::Repair { list } => {
            let mut store = scope.open_store()?;
            let list = require_list(&store, &scope, &list)?;
            let changed = store.renumber(list.id).context("Failed to renumber list")?;
            println!("{} Renumbered {} item(s) in {}", "✓".green(), changed, list.name.cyan());
            store.close()?;
        }

        Command::Daemon => {
            println!("{} Starting daemon for {}", "→".blue(), scope.root.display());

            let config = DaemonConfig::new(&scope.root).with_busy_timeout(scope.config.busy_timeout());
            let daemon = Daemon::new(config).context("Failed to create daemon")?;

            let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
            rt.block_on(daemon.run()).context("Daemon error")?;
        }

        Command::DaemonStop => {
            if !is_daemon_running(&scope.root) {
                println!("{} Daemon is not running", "✗".red());
                std::process::exit(1);
            }

            let mut client = Client::connect(&scope.root, false).context("Failed to connect to daemon")?;
            client.shutdown().context("Failed to shutdown daemon")?;
            println!("{} Daemon stopped", "✓".green());
        }

        Command::DaemonStatus => {
            if is_daemon_running(&scope.root) {
                println!("{} Daemon is running", "✓".green());

                if let Ok(mut client) = Client::connect(&scope.root, false)
                    && client.ping().is_ok()
                {
                    println!("  {} Responding to requests", "✓".green());
                }
            } else {
                println!("{} Daemon is not running", "✗".red());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
