//! Local tool registry
//!
//! Built-in tool implementations (file access, search, command execution)
//! are supplied by the embedding application through [`LocalTool`]. The
//! task-list tools live in [`super::tasks`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use super::error::LocalToolResult;
use super::tasks::TaskStore;
use crate::types::{CancellationToken, ToolResult, ToolSchema};

/// Per-call context handed to local tools
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub project_root: PathBuf,
    /// Task list owned by the calling agent session
    pub tasks: TaskStore,
    /// Cancelled when the turn is interrupted
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(project_root: impl Into<PathBuf>, tasks: TaskStore, cancel: CancellationToken) -> Self {
        Self {
            project_root: project_root.into(),
            tasks,
            cancel,
        }
    }
}

/// A tool implemented in-process
#[async_trait]
pub trait LocalTool: Send + Sync {
    fn name(&self) -> &str;

    /// Schema offered to the model
    fn schema(&self) -> ToolSchema;

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> LocalToolResult<ToolResult>;
}

type Handler = dyn Fn(Value, ToolContext) -> BoxFuture<'static, LocalToolResult<ToolResult>> + Send + Sync;

/// Local tool backed by a closure
pub struct FnTool {
    schema: ToolSchema,
    handler: Arc<Handler>,
}

impl FnTool {
    pub fn new<F>(schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(Value, ToolContext) -> BoxFuture<'static, LocalToolResult<ToolResult>> + Send + Sync + 'static,
    {
        Self {
            schema,
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl LocalTool for FnTool {
    fn name(&self) -> &str {
        self.schema.name()
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> LocalToolResult<ToolResult> {
        (self.handler)(arguments, ctx.clone()).await
    }
}

/// Name-keyed set of local tools, iterated in name order
#[derive(Clone, Default)]
pub struct LocalToolRegistry {
    tools: BTreeMap<String, Arc<dyn LocalTool>>,
}

impl LocalToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the task-list tools
    pub fn with_task_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::tasks::CreateTasksTool));
        registry.register(Arc::new(super::tasks::UpdateTasksTool));
        registry
    }

    /// Add a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Arc<dyn LocalTool>) -> Option<Arc<dyn LocalTool>> {
        self.tools.insert(tool.name().to_string(), tool)
    }

    pub fn with_tool(mut self, tool: Arc<dyn LocalTool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LocalTool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for LocalToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn echo_tool() -> FnTool {
        FnTool::new(
            ToolSchema::function("echo", "Echo the arguments", ToolSchema::empty_parameters()),
            |args, _ctx| async move { Ok(ToolResult::success(args)) }.boxed(),
        )
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = LocalToolRegistry::with_task_tools().with_tool(Arc::new(echo_tool()));
        assert_eq!(registry.names(), vec!["create_tasks", "echo", "update_tasks"]);
        assert!(registry.contains("echo"));
        assert_eq!(registry.schemas().len(), 3);

        let ctx = ToolContext::new("/tmp", TaskStore::new(), CancellationToken::new());
        let tool = registry.get("echo").unwrap();
        let result = tool.call(json!({ "x": 1 }), &ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content, Some(json!({ "x": 1 })));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = LocalToolRegistry::new();
        assert!(registry.register(Arc::new(echo_tool())).is_none());
        assert!(registry.register(Arc::new(echo_tool())).is_some());
        assert_eq!(registry.len(), 1);
    }
}
