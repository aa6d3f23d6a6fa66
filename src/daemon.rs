//! Background daemon serving concurrent command invocations.
//!
//! The daemon owns one [`Store`] and a Unix socket. Every connection is read on
//! its own task, but requests are funnelled through a channel into a single
//! event loop, so commands run one at a time against the store and nothing is
//! held across an await.

use crate::protocol::{Request, Response};
use crate::store::{Store, StoreError};
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};

/// Socket file name within the store directory.
const SOCKET_FILE: &str = "daemon.sock";

/// PID file name within the store directory.
const PID_FILE: &str = "daemon.pid";

/// Capacity of the request queue.
const REQUEST_QUEUE: usize = 100;

type Envelope = (Request, oneshot::Sender<Response>);

/// Configuration for the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Store directory
    pub root: PathBuf,

    /// Lock wait passed to the store
    pub busy_timeout: Duration,
}

impl DaemonConfig {
    /// Create config with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            busy_timeout: crate::storage::DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.root.join(SOCKET_FILE)
    }

    /// Get the PID file path.
    pub fn pid_path(&self) -> PathBuf {
        self.root.join(PID_FILE)
    }
}

/// The to-do daemon.
pub struct Daemon {
    config: DaemonConfig,
    store: Store,
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// Create a new daemon instance.
    pub fn new(config: DaemonConfig) -> Result<Self> {
        let store = Store::open_with_timeout(&config.root, config.busy_timeout).context("Failed to open store")?;

        Ok(Self {
            config,
            store,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a shutdown handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the daemon until a shutdown request arrives.
    pub async fn run(self) -> Result<()> {
        let Daemon {
            config,
            mut store,
            shutdown,
        } = self;

        // Clean up any stale socket
        let socket_path = config.socket_path();
        if socket_path.exists() {
            fs::remove_file(&socket_path).ok();
        }

        let pid_path = config.pid_path();
        fs::write(&pid_path, std::process::id().to_string()).context("Failed to write PID file")?;

        let listener = UnixListener::bind(&socket_path).context("Failed to bind to Unix socket")?;
        log::info!("Daemon listening on {:?}", socket_path);

        let (tx, mut rx) = mpsc::channel::<Envelope>(REQUEST_QUEUE);

        let acceptor = tokio::spawn(Self::accept_connections(listener, tx, Arc::clone(&shutdown)));

        while let Some((request, response_tx)) = rx.recv().await {
            let response = handle_request(&mut store, &shutdown, request);
            let _ = response_tx.send(response);

            if shutdown.load(Ordering::Relaxed) {
                log::info!("Daemon shutting down");
                break;
            }
        }

        acceptor.abort();
        fs::remove_file(&socket_path).ok();
        fs::remove_file(&pid_path).ok();

        store.close()
    }

    /// Accept connections in a background task.
    async fn accept_connections(listener: UnixListener, tx: mpsc::Sender<Envelope>, shutdown: Arc<AtomicBool>) {
        while !shutdown.load(Ordering::Relaxed) {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let tx_clone = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, tx_clone).await {
                            log::warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Handle a single client connection.
    async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<Envelope>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            if line.is_empty() {
                continue;
            }

            let request: Request = serde_json::from_str(&line).context("Failed to parse request")?;
            let is_shutdown = matches!(request, Request::Shutdown);

            let (resp_tx, resp_rx) = oneshot::channel();
            tx.send((request, resp_tx))
                .await
                .context("Failed to send request to daemon")?;

            if let Ok(response) = resp_rx.await {
                let mut response_json = serde_json::to_string(&response)?;
                response_json.push('\n');
                writer.write_all(response_json.as_bytes()).await?;
                writer.flush().await?;
            }

            if is_shutdown {
                break;
            }
        }

        Ok(())
    }
}

/// Store rejections travel typed so clients can match on them; anything else
/// is flattened to its message.
fn error_response(e: eyre::Report) -> Response {
    match e.downcast_ref::<StoreError>() {
        Some(error) => Response::Rejected { error: error.clone() },
        None => Response::error(format!("{:#}", e)),
    }
}

fn item_response<T>(result: Result<Option<T>>, wrap: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(Some(value)) => wrap(value),
        Ok(None) => Response::NotFound,
        Err(e) => error_response(e),
    }
}

fn flag_response(result: Result<bool>) -> Response {
    match result {
        Ok(true) => Response::Ok,
        Ok(false) => Response::NotFound,
        Err(e) => error_response(e),
    }
}

/// Handle a single request.
fn handle_request(store: &mut Store, shutdown: &AtomicBool, request: Request) -> Response {
    match request {
        Request::CreateList {
            guild_id,
            channel_id,
            name,
        } => match store.create_list(guild_id, channel_id, &name) {
            Ok(list) => Response::List { list },
            Err(e) => error_response(e),
        },

        Request::RenameList {
            channel_id,
            old_name,
            new_name,
        } => flag_response(store.rename_list(channel_id, &old_name, &new_name)),

        Request::DeleteList { channel_id, name } => flag_response(store.delete_list(channel_id, &name)),

        Request::FindList { channel_id, name } => {
            item_response(store.find_list(channel_id, &name), |list| Response::List { list })
        }

        Request::Lists { channel_id } => match store.lists(channel_id) {
            Ok(lists) => Response::Lists { lists },
            Err(e) => error_response(e),
        },

        Request::AddItem {
            list_id,
            name,
            status,
            priority,
        } => item_response(store.add_item(list_id, &name, status, priority), |item| {
            Response::Item { item }
        }),

        Request::MoveItem {
            list_id,
            item_id,
            priority,
        } => item_response(store.move_item(list_id, item_id, priority), |item| {
            Response::Item { item }
        }),

        Request::DeleteItem { list_id, item_id } => {
            item_response(store.delete_item(list_id, item_id), |item| Response::Item { item })
        }

        Request::RenameItem { list_id, item_id, name } => {
            flag_response(store.rename_item(list_id, item_id, &name))
        }

        Request::SetStatus {
            list_id,
            item_id,
            status,
        } => flag_response(store.set_status(list_id, item_id, status)),

        Request::Items { list_id } => match store.items(list_id) {
            Ok(items) => Response::Items { items },
            Err(e) => error_response(e),
        },

        Request::Shutdown => {
            shutdown.store(true, Ordering::Relaxed);
            Response::Ok
        }

        Request::Ping => Response::Pong,
    }
}

/// Check if a daemon is running for the given store path.
pub fn is_daemon_running(root: &Path) -> bool {
    let config = DaemonConfig::new(root);
    let socket_path = config.socket_path();
    let pid_path = config.pid_path();

    if !socket_path.exists() {
        return false;
    }

    if let Ok(pid_str) = fs::read_to_string(&pid_path)
        && let Ok(pid) = pid_str.trim().parse::<i32>()
    {
        // Signal 0 only checks that the process exists
        unsafe {
            if libc::kill(pid, 0) == 0 {
                return true;
            }
        }
    }

    // Stale socket, clean up
    fs::remove_file(&socket_path).ok();
    fs::remove_file(&pid_path).ok();
    false
}

/// Start the daemon as a background process.
pub fn start_daemon(root: &Path) -> Result<()> {
    use std::process::Command;

    let exe = std::env::current_exe().context("Failed to get current executable")?;

    Command::new(exe)
        .arg("--dir")
        .arg(root)
        .arg("daemon")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("Failed to spawn daemon process")?;

    // Give the daemon a moment to bind its socket
    std::thread::sleep(Duration::from_millis(100));

    Ok(())
}
