//! Remote tool client: one JSON-RPC peer per external tool server
//!
//! The client owns the server subprocess (or, in tests, any pair of async
//! streams), writes Content-Length frames to its stdin and correlates the
//! responses read from its stdout with pending requests by numeric id.
//! When stdout closes or the process exits the server is considered gone:
//! every pending request fails with [`McpError::ServerExited`].

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, watch, Mutex as AsyncMutex};

use super::config::RemoteServerConfig;
use super::discovery::RemoteToolSpec;
use super::error::{McpError, McpResult};
use super::frame::FrameCodec;
use crate::logging::{file_logger as log, Logger};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_millis(8_000);
pub const INITIALIZE_TIMEOUT: Duration = Duration::from_millis(5_000);

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Method names tried in order, for servers that never settled on one
const LIST_TOOLS_METHODS: &[&str] = &["tools/list", "list_tools", "tools.list"];
const CALL_TOOL_METHODS: &[&str] = &["tools/call", "call_tool", "tools.call"];

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type PendingMap = HashMap<u64, oneshot::Sender<McpResult<Value>>>;

/// State shared with the reader task
struct Shared {
    name: String,
    pending: Mutex<PendingMap>,
    alive: watch::Sender<bool>,
    /// Bumped on every (re)connect so a stale reader or waiter can't
    /// mark a newer connection as exited
    generation: AtomicU64,
    logger: Arc<dyn Logger>,
}

impl Shared {
    fn dispatch(&self, message: Value) {
        // Requests and notifications from the server carry a method; only
        // responses resolve pending requests
        if message.get("method").is_some() {
            log::trace(
                "mcp::client",
                &format!("[{}] ignoring server-initiated message {}", self.name, message["method"]),
            );
            return;
        }
        let Some(id) = message.get("id").and_then(Value::as_u64) else {
            return;
        };
        let Some(waiter) = self.pending.lock().remove(&id) else {
            log::debug("mcp::client", &format!("[{}] dropping response for unknown id {}", self.name, id));
            return;
        };

        let outcome = match message.get("error") {
            Some(error) if !error.is_null() => Err(McpError::Protocol {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("MCP error")
                    .to_string(),
            }),
            _ => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = waiter.send(outcome);
    }

    fn mark_exited(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let was_alive = self.alive.send_replace(false);
        let drained: Vec<_> = self.pending.lock().drain().collect();
        if was_alive {
            self.logger.info(&format!(
                "[RemoteToolClient:{}] Server exited ({} pending requests rejected)",
                self.name,
                drained.len()
            ));
        }
        for (_, waiter) in drained {
            let _ = waiter.send(Err(McpError::ServerExited(self.name.clone())));
        }
    }
}

/// Removes a pending entry when the request future finishes or is dropped
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.pending.lock().remove(&self.id);
    }
}

pub struct RemoteToolClient {
    config: RemoteServerConfig,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    writer: AsyncMutex<Option<BoxedWriter>>,
    kill: Mutex<Option<oneshot::Sender<()>>>,
}

impl RemoteToolClient {
    pub fn new(config: RemoteServerConfig, logger: Arc<dyn Logger>) -> Self {
        let (alive, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                name: config.name.clone(),
                pending: Mutex::new(HashMap::new()),
                alive,
                generation: AtomicU64::new(0),
                logger,
            }),
            config,
            next_id: AtomicU64::new(1),
            writer: AsyncMutex::new(None),
            kill: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RemoteServerConfig {
        &self.config
    }

    pub fn is_alive(&self) -> bool {
        *self.shared.alive.borrow()
    }

    /// Number of requests awaiting a response
    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Launch the server subprocess; a no-op while it is running
    pub async fn start(&self) -> McpResult<()> {
        let mut writer = self.writer.lock().await;
        if self.is_alive() {
            return Ok(());
        }

        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.config.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| {
            McpError::Transport(format!("failed to start '{}': {}", self.config.command, e))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("child stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("child stdout not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let name = self.config.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug("mcp::stderr", &format!("[{}] {}", name, line));
                }
            });
        }

        self.shared.logger.info(&format!(
            "[RemoteToolClient:{}] Started '{}' {:?}",
            self.config.name, self.config.command, self.config.args
        ));
        let generation = self.install(&mut writer, stdout, Box::new(stdin));

        // Exit is detected from the process itself too: a descendant that
        // inherited stdout can keep the pipe open after the server is gone
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        *self.kill.lock() = Some(kill_tx);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    shared.logger.debug(&format!(
                        "[RemoteToolClient:{}] Process finished: {:?}",
                        shared.name, status
                    ));
                }
                _ = kill_rx => {
                    let _ = child.kill().await;
                }
            }
            shared.mark_exited(generation);
        });
        Ok(())
    }

    /// Use an already-connected pair of streams instead of a subprocess
    pub async fn attach<R>(&self, reader: R, writer: impl AsyncWrite + Send + Unpin + 'static)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut slot = self.writer.lock().await;
        self.install(&mut slot, reader, Box::new(writer));
    }

    /// Returns the generation of the new connection
    fn install<R>(&self, slot: &mut Option<BoxedWriter>, reader: R, writer: BoxedWriter) -> u64
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        *slot = Some(writer);
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.alive.send_replace(true);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(read_loop(reader, shared, generation));
        generation
    }

    /// Resolves once the server is gone (immediately if it already is)
    pub async fn wait_for_exit(&self) {
        let mut alive = self.shared.alive.subscribe();
        let _ = alive.wait_for(|alive| !*alive).await;
    }

    /// Kill the subprocess; pending requests fail once its output closes
    pub async fn shutdown(&self) {
        if let Some(kill) = self.kill.lock().take() {
            let _ = kill.send(());
        }
        // Dropping the writer closes stdin, which also ends in-process peers
        self.writer.lock().await.take();
    }

    async fn write_frame(&self, message: &Value) -> McpResult<()> {
        let frame = FrameCodec::encode(message);
        let mut slot = self.writer.lock().await;
        let writer = match slot.as_mut() {
            Some(writer) if self.is_alive() => writer,
            _ => return Err(McpError::NotStarted(self.config.name.clone())),
        };
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Send a request and wait up to `timeout` for its response
    pub async fn request(&self, method: &str, params: Option<Value>, timeout: Duration) -> McpResult<Value> {
        if !self.is_alive() {
            return Err(McpError::NotStarted(self.config.name.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut message = json!({ "jsonrpc": "2.0", "method": method, "id": id });
        if let Some(params) = params {
            message["params"] = params;
        }

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(id, tx);
        let _guard = PendingGuard { shared: &self.shared, id };

        log::debug("mcp::client", &format!("[{}] -> #{} {}", self.config.name, id, method));
        self.write_frame(&message).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(McpError::ServerExited(self.config.name.clone())),
            Err(_) => {
                log::debug("mcp::client", &format!("[{}] #{} {} timed out", self.config.name, id, method));
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Send a notification (no id, no response)
    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        let mut message = json!({ "jsonrpc": "2.0", "method": method });
        if let Some(params) = params {
            message["params"] = params;
        }
        self.write_frame(&message).await
    }

    /// `initialize` handshake followed by `notifications/initialized`
    pub async fn initialize(&self) -> McpResult<Value> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "nexus", "version": env!("CARGO_PKG_VERSION") }
        });
        let result = self.request("initialize", Some(params), INITIALIZE_TIMEOUT).await?;
        self.notify("notifications/initialized", None).await?;
        Ok(result)
    }

    /// Discover tools; servers that answer none of the listing methods
    /// simply have no tools
    pub async fn list_tools(&self) -> Vec<RemoteToolSpec> {
        for method in LIST_TOOLS_METHODS {
            match self.request(method, None, DISCOVERY_TIMEOUT).await {
                Ok(result) => {
                    if let Some(tools) = RemoteToolSpec::parse_listing(&result) {
                        self.shared.logger.debug(&format!(
                            "[RemoteToolClient:{}] {} returned {} tools",
                            self.config.name,
                            method,
                            tools.len()
                        ));
                        return tools;
                    }
                }
                Err(e) => {
                    self.shared
                        .logger
                        .debug(&format!("[RemoteToolClient:{}] {} failed: {}", self.config.name, method, e));
                }
            }
        }
        Vec::new()
    }

    /// Invoke a tool and return its result payload
    ///
    /// The next candidate method is only tried when the server says it
    /// doesn't know the method, so a tool never runs twice.
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> McpResult<Value> {
        let params = json!({ "name": tool, "arguments": arguments });
        for method in CALL_TOOL_METHODS {
            match self.request(method, Some(params.clone()), DEFAULT_REQUEST_TIMEOUT).await {
                Ok(Value::Object(mut map)) if map.contains_key("result") => {
                    return Ok(map.remove("result").unwrap_or(Value::Null));
                }
                Ok(result) => return Ok(result),
                Err(e) if e.is_method_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(McpError::Unsupported(self.config.name.clone()))
    }
}

impl Drop for RemoteToolClient {
    fn drop(&mut self) {
        if let Some(kill) = self.kill.lock().take() {
            let _ = kill.send(());
        }
    }
}

impl std::fmt::Debug for RemoteToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteToolClient")
            .field("name", &self.config.name)
            .field("alive", &self.is_alive())
            .field("pending", &self.pending_count())
            .finish()
    }
}

async fn read_loop<R>(mut reader: R, shared: Arc<Shared>, generation: u64)
where
    R: AsyncRead + Send + Unpin,
{
    let mut codec = FrameCodec::new();
    let mut buf = vec![0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => codec.push(&buf[..n], |message| shared.dispatch(message)),
            Err(e) => {
                shared
                    .logger
                    .warn(&format!("[RemoteToolClient:{}] Read failed: {}", shared.name, e));
                break;
            }
        }
    }
    shared.mark_exited(generation);
}
