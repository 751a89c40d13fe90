//! Tool Execution Gateway
//!
//! Every tool call the model issues passes through [`ToolGateway::execute`]:
//!
//! 1. strip the hallucinated name prefix
//! 2. resolve the name to a [`ResolvedTool`]
//! 3. validate (agent tool scope, read-before-edit)
//! 4. apply the approval policy, prompting through an [`Approver`]
//! 5. dispatch to the local registry or a remote server
//!
//! Nothing is returned as an `Err`: failures become a failed [`ToolResult`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::filter::ToolFilter;
use super::kind::{normalize_tool_name, BuiltinTool, PathArgs, ResolvedTool};
use super::local::{LocalToolRegistry, ToolContext};
use super::policy::{ApprovalPolicy, ApprovalRequirement, Approver, ToolClass};
use super::read_tracker::{read_before_edit_error, ReadTracker};
use super::tasks::TaskStore;
use crate::logging::{file_logger as log, Logger};
use crate::mcp::RemoteToolRegistry;
use crate::types::{CancellationToken, ToolCall, ToolResult, ToolSchema};

pub const USER_REJECTED_MESSAGE: &str = "Tool execution canceled by user";
pub const USER_INTERRUPTED_MESSAGE: &str = "Tool execution interrupted by user";
pub const INVALID_REMOTE_FORMAT: &str = "Invalid MCP tool format";

/// Per-call state the orchestrator lends the gateway
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Session auto-approve as of this call
    pub session_auto_approve: bool,
    /// Cancelled when the turn is interrupted
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(session_auto_approve: bool, cancel: CancellationToken) -> Self {
        Self {
            session_auto_approve,
            cancel,
        }
    }
}

/// Result of one gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayOutcome {
    /// Tool name after normalization
    pub tool_name: String,
    pub result: ToolResult,
    /// The user asked to auto-approve approval-required tools from now on
    pub enable_session_auto_approve: bool,
    /// `file_path` / `directory` argument of the call, if any
    pub touched_path: Option<String>,
}

impl GatewayOutcome {
    fn new(tool_name: impl Into<String>, result: ToolResult) -> Self {
        Self {
            tool_name: tool_name.into(),
            result,
            enable_session_auto_approve: false,
            touched_path: None,
        }
    }

    fn touching(mut self, path: Option<String>) -> Self {
        self.touched_path = path;
        self
    }
}

enum Approval {
    Granted { enable_session: bool },
    Denied(ToolResult),
}

/// Policy layer between the model's tool calls and their implementations
pub struct ToolGateway {
    local: LocalToolRegistry,
    remote: Option<RemoteToolRegistry>,
    policy: ApprovalPolicy,
    approver: Option<Arc<dyn Approver>>,
    /// Swappable while calls are in flight (agent profile changes)
    filter: RwLock<ToolFilter>,
    reads: ReadTracker,
    tasks: TaskStore,
    project_root: PathBuf,
    logger: Arc<dyn Logger>,
}

impl ToolGateway {
    pub fn new(local: LocalToolRegistry, project_root: impl Into<PathBuf>, logger: Arc<dyn Logger>) -> Self {
        let project_root = project_root.into();
        Self {
            local,
            remote: None,
            policy: ApprovalPolicy::new(),
            approver: None,
            filter: RwLock::new(ToolFilter::new()),
            reads: ReadTracker::new(project_root.clone()),
            tasks: TaskStore::new(),
            project_root,
            logger,
        }
    }

    pub fn with_remote(mut self, remote: RemoteToolRegistry) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn with_filter(self, filter: ToolFilter) -> Self {
        *self.filter.write() = filter;
        self
    }

    pub fn with_tasks(mut self, tasks: TaskStore) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn set_filter(&self, filter: ToolFilter) {
        *self.filter.write() = filter;
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn read_tracker(&self) -> &ReadTracker {
        &self.reads
    }

    /// Schemas offered to the model: local tools, then discovered remote tools
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        let remote = self
            .remote
            .iter()
            .flat_map(|registry| registry.discovered_tools())
            .map(|tool| tool.to_schema());
        let filter = self.filter.read();
        let schemas = self
            .local
            .schemas()
            .into_iter()
            .chain(remote)
            .filter(|schema| filter.matches(schema.name()))
            .collect();
        schemas
    }

    /// Execute a model-issued call, parsing its raw argument text first
    pub async fn execute_call(&self, call: &ToolCall, ctx: &ExecutionContext) -> GatewayOutcome {
        match call.parse_arguments() {
            Ok(arguments) => self.execute(&call.name, arguments, ctx).await,
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolGateway] Unparseable arguments for {}: {}",
                    call.name, e
                ));
                GatewayOutcome::new(
                    normalize_tool_name(&call.name),
                    ToolResult::failure(format!(
                        "Tool arguments truncated: {e}. Please break this into smaller pieces or use shorter content."
                    )),
                )
            }
        }
    }

    pub async fn execute(&self, raw_name: &str, arguments: Value, ctx: &ExecutionContext) -> GatewayOutcome {
        let name = normalize_tool_name(raw_name);
        if name != raw_name {
            log::debug("tools::gateway", &format!("normalized tool name '{raw_name}' -> '{name}'"));
        }

        let resolved = ResolvedTool::resolve(name, |n| self.local.contains(n));
        let touched = PathArgs::from_value(&arguments).touched().map(str::to_string);

        if let Some(result) = self.validate(name, &resolved, &arguments) {
            self.logger
                .info(&format!("[ToolGateway] {} rejected by validation", name));
            return GatewayOutcome::new(name, result).touching(touched);
        }

        let class = self.policy.classify(&resolved);
        let enable_session = match self.approve(name, class, &arguments, ctx).await {
            Approval::Granted { enable_session } => enable_session,
            Approval::Denied(result) => return GatewayOutcome::new(name, result).touching(touched),
        };

        let result = self.dispatch(&resolved, arguments, ctx).await;
        log::debug(
            "tools::gateway",
            &format!("{} finished, success={}", name, result.success),
        );

        let mut outcome = GatewayOutcome::new(name, result).touching(touched);
        outcome.enable_session_auto_approve = enable_session;
        outcome
    }

    fn validate(&self, name: &str, resolved: &ResolvedTool, arguments: &Value) -> Option<ToolResult> {
        match resolved {
            ResolvedTool::InvalidRemote { .. } => return Some(ToolResult::failure(INVALID_REMOTE_FORMAT)),
            ResolvedTool::Unknown { .. } => return Some(ToolResult::failure(format!("Unknown tool: {name}"))),
            _ => {}
        }

        if !self.filter.read().matches(name) {
            return Some(ToolResult::failure(format!(
                "Tool '{name}' is not available for the active agent profile"
            )));
        }

        if resolved.builtin() == Some(BuiltinTool::EditFile) {
            if let Some(path) = PathArgs::from_value(arguments).file_path() {
                if !self.reads.has_read(path) {
                    return Some(ToolResult::failure(read_before_edit_error(path)));
                }
            }
        }
        None
    }

    async fn approve(&self, name: &str, class: ToolClass, arguments: &Value, ctx: &ExecutionContext) -> Approval {
        match ApprovalPolicy::requirement(class, ctx.session_auto_approve) {
            ApprovalRequirement::NotNeeded => return Approval::Granted { enable_session: false },
            ApprovalRequirement::AutoApproved => {
                self.logger
                    .debug(&format!("[ToolGateway] {} auto-approved for session", name));
                return Approval::Granted { enable_session: false };
            }
            ApprovalRequirement::Prompt => {}
        }

        if ctx.cancel.is_cancelled() {
            return Approval::Denied(ToolResult::rejected(USER_INTERRUPTED_MESSAGE));
        }

        let Some(approver) = self.approver.as_ref() else {
            self.logger.info(&format!(
                "[ToolGateway] {} needs approval but no approver is configured",
                name
            ));
            return Approval::Denied(ToolResult::rejected(USER_REJECTED_MESSAGE));
        };

        let decision = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                return Approval::Denied(ToolResult::rejected(USER_INTERRUPTED_MESSAGE));
            }
            decision = approver.request_approval(name, arguments) => decision,
        };

        if ctx.cancel.is_cancelled() {
            return Approval::Denied(ToolResult::rejected(USER_INTERRUPTED_MESSAGE));
        }
        if !decision.approved {
            self.logger.info(&format!("[ToolGateway] {} rejected by user", name));
            return Approval::Denied(ToolResult::rejected(USER_REJECTED_MESSAGE));
        }

        Approval::Granted {
            enable_session: decision.auto_approve_session && class == ToolClass::ApprovalRequired,
        }
    }

    async fn dispatch(&self, resolved: &ResolvedTool, arguments: Value, ctx: &ExecutionContext) -> ToolResult {
        match resolved {
            ResolvedTool::Local { name, builtin } => {
                let Some(tool) = self.local.get(name) else {
                    return ToolResult::failure(format!("Unknown tool: {name}"));
                };
                let read_path = match builtin {
                    Some(BuiltinTool::ReadFile) => PathArgs::from_value(&arguments).file_path().map(str::to_string),
                    _ => None,
                };
                let tool_ctx = ToolContext::new(self.project_root.clone(), self.tasks.clone(), ctx.cancel.clone());
                match tool.call(arguments, &tool_ctx).await {
                    Ok(result) => {
                        if let (true, Some(path)) = (result.success, read_path) {
                            self.reads.record_read(&path);
                        }
                        result
                    }
                    Err(e) => {
                        self.logger.warn(&format!("[ToolGateway] {} failed: {}", name, e));
                        ToolResult::failure(e.to_string())
                    }
                }
            }
            ResolvedTool::Remote { server, tool } => {
                let Some(registry) = self.remote.as_ref() else {
                    return ToolResult::failure("Remote tools are not available in this session");
                };
                match registry.call(server, tool, arguments).await {
                    Ok(data) => ToolResult::success(data),
                    Err(e) => {
                        self.logger.warn(&format!(
                            "[ToolGateway] Remote tool {}::{} failed: {}",
                            server, tool, e
                        ));
                        ToolResult::failure(e.to_string())
                    }
                }
            }
            ResolvedTool::InvalidRemote { .. } => ToolResult::failure(INVALID_REMOTE_FORMAT),
            ResolvedTool::Unknown { name } => ToolResult::failure(format!("Unknown tool: {name}")),
        }
    }
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("local", &self.local)
            .field("remote", &self.remote.is_some())
            .field("project_root", &self.project_root)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::registry::tests::{fs_handler, FakeLauncher};
    use crate::mcp::{ClientLauncher, RemoteServerConfig, ServerConfigSet};
    use crate::tools::local::{FnTool, LocalTool};
    use crate::tools::policy::ApprovalDecision;
    use crate::tools::LocalToolResult;
    use async_trait::async_trait;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Local tool that records its calls and returns a fixed result
    pub(crate) struct RecordingTool {
        name: String,
        result: ToolResult,
        pub calls: Arc<Mutex<Vec<Value>>>,
    }

    impl RecordingTool {
        pub(crate) fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                result: ToolResult::success(json!({ "ok": true })),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub(crate) fn returning(mut self, result: ToolResult) -> Self {
            self.result = result;
            self
        }
    }

    #[async_trait]
    impl LocalTool for RecordingTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::function(&self.name, "recording tool", ToolSchema::empty_parameters())
        }

        async fn call(&self, arguments: Value, _ctx: &ToolContext) -> LocalToolResult<ToolResult> {
            self.calls.lock().push(arguments);
            Ok(self.result.clone())
        }
    }

    /// Approver answering from a script; records every prompt
    pub(crate) struct ScriptedApprover {
        answers: Mutex<VecDeque<ApprovalDecision>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedApprover {
        pub(crate) fn new(answers: impl IntoIterator<Item = ApprovalDecision>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Approver for ScriptedApprover {
        async fn request_approval(&self, tool_name: &str, _arguments: &Value) -> ApprovalDecision {
            self.prompts.lock().push(tool_name.to_string());
            self.answers.lock().pop_front().unwrap_or_default()
        }
    }

    struct HangingApprover;

    #[async_trait]
    impl Approver for HangingApprover {
        async fn request_approval(&self, _tool_name: &str, _arguments: &Value) -> ApprovalDecision {
            std::future::pending().await
        }
    }

    fn gateway_with(tools: Vec<Arc<dyn LocalTool>>) -> ToolGateway {
        let mut local = LocalToolRegistry::with_task_tools();
        for tool in tools {
            local.register(tool);
        }
        ToolGateway::new(local, "/work/project", Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_read_before_edit() {
        let read = Arc::new(RecordingTool::new("read_file"));
        let edit = Arc::new(RecordingTool::new("edit_file"));
        let gateway = gateway_with(vec![read.clone(), edit.clone()]);
        let ctx = ExecutionContext::new(true, CancellationToken::new());

        let outcome = gateway.execute("edit_file", json!({ "file_path": "notes.md" }), &ctx).await;
        assert!(!outcome.result.success);
        assert!(!outcome.result.user_rejected);
        assert!(outcome.result.error.unwrap().contains("read before edit"));
        assert!(edit.calls.lock().is_empty());
        assert_eq!(outcome.touched_path.as_deref(), Some("notes.md"));

        let outcome = gateway.execute("read_file", json!({ "file_path": "./notes.md" }), &ctx).await;
        assert!(outcome.result.success);

        let outcome = gateway.execute("edit_file", json!({ "file_path": "notes.md" }), &ctx).await;
        assert!(outcome.result.success);
        assert_eq!(edit.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_does_not_count() {
        let read = Arc::new(RecordingTool::new("read_file").returning(ToolResult::failure("missing")));
        let gateway = gateway_with(vec![read, Arc::new(RecordingTool::new("edit_file"))]);
        let ctx = ExecutionContext::default();

        gateway.execute("read_file", json!({ "file_path": "a.rs" }), &ctx).await;
        assert!(!gateway.read_tracker().has_read("a.rs"));
    }

    #[tokio::test]
    async fn test_dangerous_prompts_despite_session_auto_approve() {
        let exec = Arc::new(RecordingTool::new("execute_command"));
        let approver = Arc::new(ScriptedApprover::new([ApprovalDecision::reject()]));
        let gateway = gateway_with(vec![exec.clone()]).with_approver(approver.clone());

        let ctx = ExecutionContext::new(true, CancellationToken::new());
        let outcome = gateway.execute("execute_command", json!({ "command": "rm -rf /" }), &ctx).await;

        assert_eq!(approver.prompts.lock().as_slice(), ["execute_command"]);
        assert!(!outcome.result.success);
        assert!(outcome.result.user_rejected);
        assert_eq!(outcome.result.error.as_deref(), Some(USER_REJECTED_MESSAGE));
        assert!(exec.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_approval_required_skips_prompt_under_session_auto_approve() {
        let create = Arc::new(RecordingTool::new("create_file"));
        let approver = Arc::new(ScriptedApprover::new([]));
        let gateway = gateway_with(vec![create.clone()]).with_approver(approver.clone());

        let ctx = ExecutionContext::new(true, CancellationToken::new());
        let outcome = gateway.execute("create_file", json!({ "file_path": "a.rs" }), &ctx).await;
        assert!(outcome.result.success);
        assert!(approver.prompts.lock().is_empty());
        assert_eq!(create.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_session_approval_is_propagated_only_for_approval_required() {
        let approver = Arc::new(ScriptedApprover::new([
            ApprovalDecision::approve_for_session(),
            ApprovalDecision::approve_for_session(),
        ]));
        let gateway = gateway_with(vec![
            Arc::new(RecordingTool::new("create_file")),
            Arc::new(RecordingTool::new("delete_file")),
        ])
        .with_approver(approver);
        let ctx = ExecutionContext::default();

        let outcome = gateway.execute("create_file", json!({}), &ctx).await;
        assert!(outcome.result.success);
        assert!(outcome.enable_session_auto_approve);

        let outcome = gateway.execute("delete_file", json!({}), &ctx).await;
        assert!(outcome.result.success);
        assert!(!outcome.enable_session_auto_approve);
    }

    #[tokio::test]
    async fn test_no_approver_rejects() {
        let gateway = gateway_with(vec![Arc::new(RecordingTool::new("delete_file"))]);
        let outcome = gateway
            .execute("delete_file", json!({ "file_path": "a" }), &ExecutionContext::default())
            .await;
        assert!(outcome.result.user_rejected);
    }

    #[tokio::test]
    async fn test_interrupt_abandons_approval_wait() {
        let gateway = gateway_with(vec![Arc::new(RecordingTool::new("execute_command"))])
            .with_approver(Arc::new(HangingApprover));
        let cancel = CancellationToken::new();
        let ctx = ExecutionContext::new(false, cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = gateway.execute("execute_command", json!({}), &ctx).await;
        assert!(outcome.result.user_rejected);
        assert_eq!(outcome.result.error.as_deref(), Some(USER_INTERRUPTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_names_and_arguments() {
        let read = Arc::new(RecordingTool::new("read_file"));
        let gateway = gateway_with(vec![read.clone()]);
        let ctx = ExecutionContext::default();

        let outcome = gateway.execute("repo_browser.read_file", json!({ "file_path": "x" }), &ctx).await;
        assert_eq!(outcome.tool_name, "read_file");
        assert!(outcome.result.success);

        let outcome = gateway.execute("teleport", json!({}), &ctx).await;
        assert_eq!(outcome.result.error.as_deref(), Some("Unknown tool: teleport"));

        let outcome = gateway.execute("mcp__fs", json!({}), &ctx).await;
        assert_eq!(outcome.result.error.as_deref(), Some(INVALID_REMOTE_FORMAT));

        let truncated = ToolCall::new("c1", "read_file", r#"{"file_path": "a"#);
        let outcome = gateway.execute_call(&truncated, &ctx).await;
        assert!(!outcome.result.success);
        assert!(!outcome.result.user_rejected);
        assert!(outcome.result.error.unwrap().starts_with("Tool arguments truncated:"));
        assert_eq!(read.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_errors_are_wrapped() {
        let failing = FnTool::new(
            ToolSchema::function("explode", "always fails", ToolSchema::empty_parameters()),
            |_args, _ctx| async { Err::<ToolResult, _>(crate::tools::ToolError::failed("boom")) }.boxed(),
        );
        let gateway = gateway_with(vec![Arc::new(failing)]);
        let outcome = gateway.execute("explode", json!({}), &ExecutionContext::default()).await;
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_task_tools_use_gateway_store() {
        let gateway = gateway_with(Vec::new());
        let outcome = gateway
            .execute(
                "create_tasks",
                json!({ "user_query": "q", "tasks": [{ "id": "1", "description": "d" }] }),
                &ExecutionContext::default(),
            )
            .await;
        assert!(outcome.result.success);
        assert_eq!(gateway.tasks().snapshot().unwrap().tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_routing_and_filter() {
        let launcher: Arc<dyn ClientLauncher> = Arc::new(FakeLauncher::new().with_server("fs", fs_handler()));
        let remote = RemoteToolRegistry::new(
            ServerConfigSet::from_entries(vec![RemoteServerConfig::new("fs", "fs-server")]),
            launcher,
            Arc::new(NoOpLogger),
        );
        let approver = Arc::new(ScriptedApprover::new([ApprovalDecision::approve()]));
        let gateway = gateway_with(Vec::new())
            .with_remote(remote.clone())
            .with_approver(approver.clone());
        let ctx = ExecutionContext::default();

        let outcome = gateway.execute("mcp__fs__list_dir", json!({ "path": "." }), &ctx).await;
        assert!(!outcome.result.success);
        assert_eq!(approver.prompts.lock().len(), 1);

        remote.connect("fs").await.unwrap();
        let names: Vec<_> = gateway.tool_schemas().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["create_tasks", "update_tasks", "mcp__fs__list_dir"]);

        let outcome = gateway
            .execute("mcp__fs__list_dir", json!({ "path": "." }), &ExecutionContext::new(true, CancellationToken::new()))
            .await;
        assert!(outcome.result.success);
        assert_eq!(outcome.result.content.unwrap()["path"], ".");

        gateway.set_filter(ToolFilter::new().with_include(["mcp__*"]).unwrap());
        let names: Vec<_> = gateway.tool_schemas().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["mcp__fs__list_dir"]);
        let outcome = gateway.execute("create_tasks", json!({}), &ctx).await;
        assert!(outcome.result.error.unwrap().contains("not available"));
    }
}
