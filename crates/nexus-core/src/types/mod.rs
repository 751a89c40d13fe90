//! Core types shared by the orchestrator, the gateway and the providers
//!
//! Shapes follow the chat-completions wire format so a provider can
//! serialize history and tool schemas without translation.

mod message;
mod tool;
mod cancellation;

pub use message::{Message, Role};
pub use tool::{FunctionSchema, ToolCall, ToolChoice, ToolResult, ToolSchema};
pub use cancellation::CancellationToken;
