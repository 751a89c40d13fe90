//! Tool resolution, approval policy and execution
//!
//! ```text
//! model tool call
//!       │
//!       ▼
//! ToolGateway ── normalize ── resolve ── validate ── approve ── dispatch
//!                                                        │          │
//!                                                   Approver   LocalToolRegistry
//!                                                              RemoteToolRegistry
//! ```

mod error;
mod filter;
pub(crate) mod gateway;
mod kind;
mod local;
mod policy;
mod read_tracker;
mod tasks;

pub(crate) use filter::build_globset;

pub use error::{LocalToolResult, ToolError};
pub use filter::ToolFilter;
pub use gateway::{
    ExecutionContext, GatewayOutcome, ToolGateway, INVALID_REMOTE_FORMAT, USER_INTERRUPTED_MESSAGE,
    USER_REJECTED_MESSAGE,
};
pub use kind::{normalize_tool_name, BuiltinTool, PathArgs, ResolvedTool, HALLUCINATED_PREFIX};
pub use local::{FnTool, LocalTool, LocalToolRegistry, ToolContext};
pub use policy::{ApprovalDecision, ApprovalPolicy, ApprovalRequirement, Approver, ToolClass};
pub use read_tracker::{read_before_edit_error, ReadTracker};
pub use tasks::{CreateTasksTool, Task, TaskList, TaskStatus, TaskStore, TaskUpdate, UpdateTasksTool};
