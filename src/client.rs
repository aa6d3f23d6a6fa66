//! Client for connecting to the to-do daemon.

use crate::daemon::{DaemonConfig, is_daemon_running, start_daemon};
use crate::protocol::{Request, Response};
use crate::types::{Item, ItemId, ListId, Status, TodoList};
use eyre::{Context, Result, bail};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client for communicating with the daemon.
pub struct Client {
    root: PathBuf,
    stream: UnixStream,
}

impl Client {
    /// Connect to the daemon, optionally auto-starting it if not running.
    pub fn connect(root: &Path, auto_start: bool) -> Result<Self> {
        let config = DaemonConfig::new(root);
        let socket_path = config.socket_path();

        let stream = match UnixStream::connect(&socket_path) {
            Ok(stream) => stream,
            Err(_) if auto_start => {
                if !is_daemon_running(root) {
                    start_daemon(root).context("Failed to auto-start daemon")?;
                }

                let mut attempts = 0;
                loop {
                    if let Ok(stream) = UnixStream::connect(&socket_path) {
                        break stream;
                    }
                    if attempts > 20 {
                        bail!("Daemon failed to start in time");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                    attempts += 1;
                }
            }
            Err(e) => {
                bail!("Failed to connect to daemon: {}. Is it running?", e);
            }
        };

        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .context("Failed to set read timeout")?;

        Ok(Self {
            root: root.to_path_buf(),
            stream,
        })
    }

    /// Get the store root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Send a request and receive a response.
    fn request(&mut self, request: Request) -> Result<Response> {
        let request_json = serde_json::to_string(&request)?;
        writeln!(self.stream, "{}", request_json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut response_line = String::new();
        reader.read_line(&mut response_line)?;

        let response: Response = serde_json::from_str(&response_line).context("Failed to parse response")?;
        Ok(response)
    }

    fn expect_list(&mut self, request: Request) -> Result<Option<TodoList>> {
        match self.request(request)? {
            Response::List { list } => Ok(Some(list)),
            Response::NotFound => Ok(None),
            other => Err(failure(other)),
        }
    }

    fn expect_item(&mut self, request: Request) -> Result<Option<Item>> {
        match self.request(request)? {
            Response::Item { item } => Ok(Some(item)),
            Response::NotFound => Ok(None),
            other => Err(failure(other)),
        }
    }

    fn expect_flag(&mut self, request: Request) -> Result<bool> {
        match self.request(request)? {
            Response::Ok => Ok(true),
            Response::NotFound => Ok(false),
            other => Err(failure(other)),
        }
    }

    pub fn create_list(&mut self, guild_id: i64, channel_id: i64, name: &str) -> Result<TodoList> {
        match self.expect_list(Request::CreateList {
            guild_id,
            channel_id,
            name: name.to_string(),
        })? {
            Some(list) => Ok(list),
            None => bail!("Unexpected response"),
        }
    }

    pub fn rename_list(&mut self, channel_id: i64, old_name: &str, new_name: &str) -> Result<bool> {
        self.expect_flag(Request::RenameList {
            channel_id,
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub fn delete_list(&mut self, channel_id: i64, name: &str) -> Result<bool> {
        self.expect_flag(Request::DeleteList {
            channel_id,
            name: name.to_string(),
        })
    }

    pub fn find_list(&mut self, channel_id: i64, name: &str) -> Result<Option<TodoList>> {
        self.expect_list(Request::FindList {
            channel_id,
            name: name.to_string(),
        })
    }

    pub fn lists(&mut self, channel_id: i64) -> Result<Vec<TodoList>> {
        match self.request(Request::Lists { channel_id })? {
            Response::Lists { lists } => Ok(lists),
            other => Err(failure(other)),
        }
    }

    pub fn add_item(
        &mut self,
        list_id: ListId,
        name: &str,
        status: Status,
        priority: Option<i64>,
    ) -> Result<Option<Item>> {
        self.expect_item(Request::AddItem {
            list_id,
            name: name.to_string(),
            status,
            priority,
        })
    }

    pub fn move_item(&mut self, list_id: ListId, item_id: ItemId, priority: i64) -> Result<Option<Item>> {
        self.expect_item(Request::MoveItem {
            list_id,
            item_id,
            priority,
        })
    }

    pub fn delete_item(&mut self, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
        self.expect_item(Request::DeleteItem { list_id, item_id })
    }

    pub fn rename_item(&mut self, list_id: ListId, item_id: ItemId, name: &str) -> Result<bool> {
        self.expect_flag(Request::RenameItem {
            list_id,
            item_id,
            name: name.to_string(),
        })
    }

    pub fn set_status(&mut self, list_id: ListId, item_id: ItemId, status: Status) -> Result<bool> {
        self.expect_flag(Request::SetStatus {
            list_id,
            item_id,
            status,
        })
    }

    pub fn items(&mut self, list_id: ListId) -> Result<Vec<Item>> {
        match self.request(Request::Items { list_id })? {
            Response::Items { items } => Ok(items),
            other => Err(failure(other)),
        }
    }

    /// Ping the daemon.
    pub fn ping(&mut self) -> Result<()> {
        match self.request(Request::Ping)? {
            Response::Pong => Ok(()),
            _ => bail!("Unexpected response to ping"),
        }
    }

    /// Request daemon shutdown.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.request(Request::Shutdown)? {
            Response::Ok => Ok(()),
            other => Err(failure(other)),
        }
    }
}

/// Turn a non-success response into an error. Store rejections are rebuilt as
/// [`StoreError`](crate::StoreError) so callers can downcast them like local errors.
fn failure(response: Response) -> eyre::Report {
    match response {
        Response::Rejected { error } => eyre::eyre!(error),
        Response::Error { message } => eyre::eyre!(message),
        other => eyre::eyre!("Unexpected response: {:?}", other),
    }
}
