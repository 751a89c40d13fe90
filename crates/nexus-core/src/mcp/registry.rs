//! Remote tool registry: the set of configured servers and their live clients
//!
//! Clients are created on the first `connect` for a server and dropped when
//! their process exits, which permits a later reconnect. Discovered tools
//! are cached per server and removed together with the client.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use super::client::{RemoteToolClient, DEFAULT_REQUEST_TIMEOUT};
use super::config::{RemoteServerConfig, ServerConfigSet};
use super::discovery::DiscoveredTool;
use super::error::{McpError, McpResult};
use crate::config::paths;
use crate::logging::{DebugFileLogger, Logger};

/// Creates and starts a client for one server
#[async_trait]
pub trait ClientLauncher: Send + Sync {
    async fn launch(&self, config: &RemoteServerConfig, logger: Arc<dyn Logger>) -> McpResult<Arc<RemoteToolClient>>;
}

/// Launches each server as a subprocess
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl ClientLauncher for ProcessLauncher {
    async fn launch(&self, config: &RemoteServerConfig, logger: Arc<dyn Logger>) -> McpResult<Arc<RemoteToolClient>> {
        let client = Arc::new(RemoteToolClient::new(config.clone(), logger));
        client.start().await?;
        Ok(client)
    }
}

/// A server that could not be connected
#[derive(Debug)]
pub struct ConnectFailure {
    pub server: String,
    pub error: McpError,
}

struct RegistryInner {
    configs: ServerConfigSet,
    clients: RwLock<HashMap<String, Arc<RemoteToolClient>>>,
    discovered: RwLock<BTreeMap<String, Vec<DiscoveredTool>>>,
    /// Serializes connects per server so two callers don't launch twice
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    launcher: Arc<dyn ClientLauncher>,
    logger: Arc<dyn Logger>,
}

impl RegistryInner {
    fn is_current(&self, server: &str, client: &Arc<RemoteToolClient>) -> bool {
        self.clients
            .read()
            .get(server)
            .is_some_and(|current| Arc::ptr_eq(current, client))
    }

    fn forget(&self, server: &str, client: &Arc<RemoteToolClient>) {
        let mut clients = self.clients.write();
        if clients.get(server).is_some_and(|current| Arc::ptr_eq(current, client)) {
            clients.remove(server);
            self.discovered.write().remove(server);
            self.logger.info(&format!("[RemoteToolRegistry] Server '{}' disconnected", server));
        }
    }
}

/// Cheap to clone; clones share the same clients
#[derive(Clone)]
pub struct RemoteToolRegistry {
    inner: Arc<RegistryInner>,
}

static GLOBAL: Lazy<RemoteToolRegistry> = Lazy::new(|| {
    let logger: Arc<dyn Logger> = Arc::new(DebugFileLogger::new("mcp::registry"));
    RemoteToolRegistry::from_file(&paths::mcp_servers_file(), Arc::new(ProcessLauncher), logger)
});

impl RemoteToolRegistry {
    pub fn new(configs: ServerConfigSet, launcher: Arc<dyn ClientLauncher>, logger: Arc<dyn Logger>) -> Self {
        for issue in &configs.issues {
            logger.warn(&format!("[RemoteToolRegistry] Skipping server config: {}", issue));
        }
        Self {
            inner: Arc::new(RegistryInner {
                configs,
                clients: RwLock::new(HashMap::new()),
                discovered: RwLock::new(BTreeMap::new()),
                gates: Mutex::new(HashMap::new()),
                launcher,
                logger,
            }),
        }
    }

    pub fn from_file(path: &Path, launcher: Arc<dyn ClientLauncher>, logger: Arc<dyn Logger>) -> Self {
        Self::new(ServerConfigSet::load(path), launcher, logger)
    }

    /// Process-wide registry built from the workspace server list
    pub fn global() -> &'static RemoteToolRegistry {
        &GLOBAL
    }

    pub fn configured_servers(&self) -> Vec<String> {
        self.inner.configs.names()
    }

    /// Problems found while loading the server list
    pub fn config_issues(&self) -> &[String] {
        &self.inner.configs.issues
    }

    pub fn is_connected(&self, server: &str) -> bool {
        self.inner
            .clients
            .read()
            .get(server)
            .is_some_and(|client| client.is_alive())
    }

    fn gate(&self, server: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.inner.gates.lock().entry(server.to_string()).or_default())
    }

    /// Connect to one server, run the handshake and discover its tools
    ///
    /// A no-op when already connected. The handshake and discovery are best
    /// effort; only launching can fail.
    pub async fn connect(&self, server: &str) -> McpResult<()> {
        let config = self
            .inner
            .configs
            .get(server)
            .cloned()
            .ok_or_else(|| McpError::UnknownServer(server.to_string()))?;

        let gate = self.gate(server);
        let _guard = gate.lock().await;
        if self.is_connected(server) {
            return Ok(());
        }

        let client = self
            .inner
            .launcher
            .launch(&config, Arc::clone(&self.inner.logger))
            .await?;
        self.inner
            .clients
            .write()
            .insert(server.to_string(), Arc::clone(&client));
        self.watch_exit(server, &client);

        if let Err(e) = client.initialize().await {
            self.inner
                .logger
                .debug(&format!("[RemoteToolRegistry] '{}' initialize skipped: {}", server, e));
        }

        let tools: Vec<DiscoveredTool> = client
            .list_tools()
            .await
            .into_iter()
            .map(|spec| DiscoveredTool::new(server, spec))
            .collect();

        if self.inner.is_current(server, &client) {
            self.inner.logger.info(&format!(
                "[RemoteToolRegistry] Connected '{}' with {} tools",
                server,
                tools.len()
            ));
            self.inner.discovered.write().insert(server.to_string(), tools);
        }
        Ok(())
    }

    fn watch_exit(&self, server: &str, client: &Arc<RemoteToolClient>) {
        let inner: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let server = server.to_string();
        let client = Arc::clone(client);
        tokio::spawn(async move {
            client.wait_for_exit().await;
            if let Some(inner) = inner.upgrade() {
                inner.forget(&server, &client);
            }
        });
    }

    /// Connect every configured server concurrently; failures are isolated
    /// and returned
    pub async fn ensure_connected_all(&self) -> Vec<ConnectFailure> {
        let names = self.configured_servers();
        let results = join_all(names.iter().map(|name| self.connect(name))).await;

        names
            .into_iter()
            .zip(results)
            .filter_map(|(server, result)| {
                result.err().map(|error| {
                    self.inner
                        .logger
                        .warn(&format!("[RemoteToolRegistry] Failed to connect '{}': {}", server, error));
                    ConnectFailure { server, error }
                })
            })
            .collect()
    }

    /// Tools of every connected server, ordered by server name
    pub fn discovered_tools(&self) -> Vec<DiscoveredTool> {
        self.inner
            .discovered
            .read()
            .values()
            .flat_map(|tools| tools.iter().cloned())
            .collect()
    }

    fn client(&self, server: &str) -> McpResult<Arc<RemoteToolClient>> {
        self.inner
            .clients
            .read()
            .get(server)
            .cloned()
            .ok_or_else(|| McpError::NotConnected(server.to_string()))
    }

    /// Invoke a tool on a connected server
    pub async fn call(&self, server: &str, tool: &str, arguments: Value) -> McpResult<Value> {
        self.client(server)?.call_tool(tool, arguments).await
    }

    /// Forward an arbitrary request to a connected server
    pub async fn request(&self, server: &str, method: &str, params: Option<Value>) -> McpResult<Value> {
        self.client(server)?
            .request(method, params, DEFAULT_REQUEST_TIMEOUT)
            .await
    }

    /// Stop every running server
    pub async fn shutdown_all(&self) {
        let clients: Vec<_> = self.inner.clients.read().values().cloned().collect();
        for client in clients {
            client.shutdown().await;
        }
    }
}

impl std::fmt::Debug for RemoteToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteToolRegistry")
            .field("configured", &self.configured_servers())
            .field("connected", &self.inner.clients.read().keys().cloned().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logging::{MemoryLogger, NoOpLogger};
    use crate::mcp::client::tests::{spawn_fake_server, Handler};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Launches in-process fake servers; commands named "fail" refuse to start
    pub(crate) struct FakeLauncher {
        handlers: HashMap<String, Handler>,
        pub launches: AtomicUsize,
    }

    impl FakeLauncher {
        pub(crate) fn new() -> Self {
            Self {
                handlers: HashMap::new(),
                launches: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_server(mut self, name: &str, handler: Handler) -> Self {
            self.handlers.insert(name.to_string(), handler);
            self
        }
    }

    #[async_trait]
    impl ClientLauncher for FakeLauncher {
        async fn launch(&self, config: &RemoteServerConfig, logger: Arc<dyn Logger>) -> McpResult<Arc<RemoteToolClient>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let handler = self
                .handlers
                .get(&config.name)
                .cloned()
                .ok_or_else(|| McpError::Transport(format!("failed to start '{}'", config.command)))?;
            let client = Arc::new(RemoteToolClient::new(config.clone(), logger));
            let (reader, writer, _) = spawn_fake_server(handler);
            client.attach(reader, writer).await;
            Ok(client)
        }
    }

    pub(crate) fn fs_handler() -> Handler {
        Arc::new(|method, params| match method {
            "initialize" => Some(json!({ "result": {} })),
            "tools/list" => Some(json!({ "result": { "tools": [{ "name": "list_dir" }] } })),
            "tools/call" => Some(json!({ "result": { "listing": ["a.txt"], "path": params["arguments"]["path"] } })),
            _ => Some(json!({ "error": { "code": -32601, "message": "Method not found" } })),
        })
    }

    fn registry(configs: Vec<RemoteServerConfig>, launcher: FakeLauncher) -> (RemoteToolRegistry, Arc<FakeLauncher>) {
        let launcher = Arc::new(launcher);
        let registry = RemoteToolRegistry::new(
            ServerConfigSet::from_entries(configs),
            Arc::clone(&launcher) as Arc<dyn ClientLauncher>,
            Arc::new(NoOpLogger),
        );
        (registry, launcher)
    }

    #[tokio::test]
    async fn test_connect_discovers_tools() {
        let (registry, launcher) = registry(
            vec![RemoteServerConfig::new("fs", "fs-server")],
            FakeLauncher::new().with_server("fs", fs_handler()),
        );

        registry.connect("fs").await.unwrap();
        registry.connect("fs").await.unwrap();
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);

        let tools = registry.discovered_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].server, "fs");
        assert_eq!(tools[0].name, "list_dir");
        assert_eq!(tools[0].namespaced_name(), "mcp__fs__list_dir");

        let result = registry.call("fs", "list_dir", json!({ "path": "." })).await.unwrap();
        assert_eq!(result["path"], ".");
    }

    #[tokio::test]
    async fn test_unknown_and_unconnected() {
        let (registry, _) = registry(
            vec![RemoteServerConfig::new("fs", "fs-server")],
            FakeLauncher::new().with_server("fs", fs_handler()),
        );

        assert!(matches!(registry.connect("nope").await, Err(McpError::UnknownServer(_))));
        assert!(matches!(
            registry.call("fs", "list_dir", json!({})).await,
            Err(McpError::NotConnected(_))
        ));
        assert!(matches!(
            registry.request("fs", "ping", None).await,
            Err(McpError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_one_failing_server_does_not_block_others() {
        let (registry, _) = registry(
            vec![
                RemoteServerConfig::new("broken", "fail"),
                RemoteServerConfig::new("fs", "fs-server"),
            ],
            FakeLauncher::new().with_server("fs", fs_handler()),
        );

        let failures = registry.ensure_connected_all().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].server, "broken");
        assert!(registry.is_connected("fs"));

        let names: Vec<_> = registry.discovered_tools().iter().map(|t| t.namespaced_name()).collect();
        assert_eq!(names, vec!["mcp__fs__list_dir"]);
    }

    #[tokio::test]
    async fn test_exit_removes_client_and_tools_then_reconnects() {
        let (registry, launcher) = registry(
            vec![RemoteServerConfig::new("fs", "fs-server")],
            FakeLauncher::new().with_server("fs", fs_handler()),
        );
        registry.connect("fs").await.unwrap();
        assert_eq!(registry.discovered_tools().len(), 1);

        registry.shutdown_all().await;
        for _ in 0..50 {
            if !registry.is_connected("fs") && registry.discovered_tools().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!registry.is_connected("fs"));
        assert!(registry.discovered_tools().is_empty());
        assert!(matches!(
            registry.call("fs", "list_dir", json!({})).await,
            Err(McpError::NotConnected(_))
        ));

        registry.connect("fs").await.unwrap();
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
        assert_eq!(registry.discovered_tools().len(), 1);
    }

    #[tokio::test]
    async fn test_raw_request_forwarding() {
        let handler: Handler = Arc::new(|method, _| match method {
            "resources/list" => Some(json!({ "result": { "resources": [] } })),
            _ => Some(json!({ "result": {} })),
        });
        let (registry, _) = registry(
            vec![RemoteServerConfig::new("docs", "docs-server")],
            FakeLauncher::new().with_server("docs", handler),
        );
        registry.connect("docs").await.unwrap();

        let result = registry.request("docs", "resources/list", None).await.unwrap();
        assert_eq!(result, json!({ "resources": [] }));
    }

    #[test]
    fn test_config_issues_are_logged() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = RemoteToolRegistry::new(
            ServerConfigSet::from_entries(vec![RemoteServerConfig::new("a__b", "x")]),
            Arc::new(ProcessLauncher),
            logger.clone(),
        );
        assert!(registry.configured_servers().is_empty());
        assert_eq!(registry.config_issues().len(), 1);
        assert!(logger.contains("WARN", "a__b"));
    }
}
