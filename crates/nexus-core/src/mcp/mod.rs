//! Remote tool servers over Content-Length framed JSON-RPC on stdio
//!
//! ```rust,ignore
//! use nexus_core::mcp::RemoteToolRegistry;
//!
//! let registry = RemoteToolRegistry::global();
//! let failures = registry.ensure_connected_all().await;
//!
//! for tool in registry.discovered_tools() {
//!     println!("{}", tool.namespaced_name()); // mcp__fs__list_dir
//! }
//! let result = registry.call("fs", "list_dir", json!({ "path": "." })).await?;
//! ```

mod error;
mod frame;
pub mod config;
mod discovery;
pub(crate) mod client;
pub(crate) mod registry;

pub use error::{McpError, McpResult, INVALID_REQUEST, METHOD_NOT_FOUND};
pub use frame::FrameCodec;
pub use config::{RemoteServerConfig, ServerConfigSet};
pub use discovery::{
    is_namespaced, namespaced_name, split_namespaced, DiscoveredTool, RemoteToolSpec, NAMESPACE, NAME_DELIMITER,
};
pub use client::{
    RemoteToolClient, DEFAULT_REQUEST_TIMEOUT, DISCOVERY_TIMEOUT, INITIALIZE_TIMEOUT, PROTOCOL_VERSION,
};
pub use registry::{ClientLauncher, ConnectFailure, ProcessLauncher, RemoteToolRegistry};
