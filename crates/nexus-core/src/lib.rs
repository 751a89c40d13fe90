//! Nexus Core
//!
//! Agent runtime core: the conversation loop, the tool gateway in front of
//! local and remote tools, and the stdio client for remote tool servers.
//! Front ends (terminal UI, editor integrations) drive an [`Agent`] and
//! consume its [`AgentEvent`]s.
//!
//! ## Turn flow
//!
//! ```text
//! chat(input)
//!   ├─ @rule references → system messages
//!   ├─ completion request (tools offered through the active filter)
//!   ├─ tool calls, one at a time, through ToolGateway
//!   │     normalize → resolve → validate → approve → dispatch
//!   └─ final answer, with path-scoped rules attached for the next turn
//! ```
//!
//! ```rust,ignore
//! use nexus_core::{Agent, AgentSettings, TurnOutcome};
//!
//! let agent = Agent::builder()
//!     .with_settings(AgentSettings::load()?)
//!     .with_channel_prompts()
//!     .build();
//! let mut events = agent.subscribe();
//!
//! let outcome = agent.chat("list the files in src").await?;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod mcp;
pub mod tools;
pub mod events;
pub mod agent;

// Re-export commonly used types
pub use types::{CancellationToken, Message, Role, ToolCall, ToolChoice, ToolResult, ToolSchema};

pub use secrets::{ChainSecretStore, EnvSecretStore, KeychainSecretStore, MemorySecretStore, SecretStore};

pub use logging::{ConsoleLogger, Logger, NoOpLogger};

pub use config::{AgentSettings, ConfigError, ConfigResult};

pub use providers::{
    CompletionProvider, CompletionRequest, CompletionResponse, CredentialResolver, HttpProviderFactory,
    ProviderError, ProviderFactory, ProviderResult,
};

pub use mcp::{McpError, McpResult, RemoteServerConfig, RemoteToolRegistry};

pub use tools::{
    ApprovalDecision, ApprovalPolicy, Approver, LocalTool, LocalToolRegistry, TaskList, ToolFilter, ToolGateway,
};

pub use events::{AgentEvent, EventBus, PromptToken};

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentHandle, AgentProfile, AgentResult, ChannelPrompter, ContinuationDecider,
    ProjectRule, TurnOutcome, TurnState,
};
