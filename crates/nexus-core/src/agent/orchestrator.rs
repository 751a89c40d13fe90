//! Conversation Orchestrator
//!
//! Owns the message history and drives one chat turn at a time:
//! completion request, sequential tool execution through the
//! [`ToolGateway`], and the interruption, approval, iteration-cap and
//! provider-error flows around them. Progress is published on the
//! agent's [`EventBus`].
//!
//! Session state sits behind a short-lived lock that is never held across
//! an `.await`, so history stays readable while a turn is suspended on a
//! completion or an approval prompt. Overlapping turns are refused by a
//! separate turn guard.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::approval::{ChannelPrompter, ContinuationDecider};
use super::error::{AgentError, AgentResult};
use super::profile::AgentProfile;
use super::rules::{agent_rules, auto_attach_rules, find_manual_rules, ProjectRule};
use super::state::{StateCell, TurnOutcome, TurnState};
use crate::config::paths::detect_project_root;
use crate::config::AgentSettings;
use crate::events::{AgentEvent, EventBus};
use crate::logging::{file_logger as log, Logger, NoOpLogger};
use crate::mcp::{ConnectFailure, RemoteToolRegistry};
use crate::providers::{
    CompletionProvider, CompletionRequest, CompletionResponse, CredentialResolver, HttpProviderFactory,
    ProviderError, ProviderFactory,
};
use crate::secrets::SecretStore;
use crate::tools::{
    ApprovalDecision, ApprovalPolicy, Approver, ExecutionContext, LocalToolRegistry, TaskList, ToolFilter,
    ToolGateway,
};
use crate::types::{CancellationToken, Message, ToolCall};

/// System note appended when the user interrupts a turn
pub const INTERRUPTED_NOTE: &str = "User has interrupted the request.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a coding assistant working inside the user's project. \
Use the available tools to inspect and change files, read a file before editing it, \
and keep changes focused. Be direct and efficient.";

fn rejection_note(tool_name: &str) -> String {
    format!(
        "The user rejected the {tool_name} tool execution. The response has been terminated. \
         Please wait for the user's next instruction."
    )
}

fn provider_error_note(error: &ProviderError) -> String {
    format!(
        "Previous API request failed with error: {error}. \
         Please try a different approach or ask the user for clarification."
    )
}

/// Marks the turn as awaiting approval while a prompt is open
struct StateTrackingApprover {
    inner: Arc<dyn Approver>,
    state: StateCell,
}

#[async_trait]
impl Approver for StateTrackingApprover {
    async fn request_approval(&self, tool_name: &str, arguments: &Value) -> ApprovalDecision {
        self.state.set(TurnState::AwaitingApproval);
        let decision = self.inner.request_approval(tool_name, arguments).await;
        self.state.set(TurnState::ExecutingTools);
        decision
    }
}

/// Conversation state shared between the running turn and callers
struct Session {
    settings: AgentSettings,
    messages: Vec<Message>,
    provider: Option<Arc<dyn CompletionProvider>>,
    session_auto_approve: bool,
    /// Current base system prompt, as inserted into history
    system_prompt: String,
    active_profile: Option<String>,
}

impl Session {
    fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    fn replace_system_prompt(&mut self, prompt: String) {
        let current = std::mem::replace(&mut self.system_prompt, prompt.clone());
        match self
            .messages
            .iter_mut()
            .find(|m| m.is_system() && m.content == current)
        {
            Some(message) => message.content = prompt,
            None => self.push_system(prompt),
        }
    }
}

/// Held for the duration of one turn; releases the flag on drop
struct TurnGuard<'a>(&'a AtomicBool);

impl<'a> TurnGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TurnGuard(flag))
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Interrupts the agent's current turn from another task
#[derive(Clone)]
pub struct AgentHandle {
    cancel: Arc<Mutex<CancellationToken>>,
    state: StateCell,
}

impl AgentHandle {
    pub fn interrupt(&self) {
        self.cancel.lock().cancel();
    }

    pub fn state(&self) -> TurnState {
        self.state.get()
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle").field("state", &self.state()).finish()
    }
}

pub struct Agent {
    session: Mutex<Session>,
    turn_active: AtomicBool,
    gateway: ToolGateway,
    rules: Vec<ProjectRule>,
    factory: Arc<dyn ProviderFactory>,
    credentials: CredentialResolver,
    continuation: Option<Arc<dyn ContinuationDecider>>,
    prompter: Option<ChannelPrompter>,
    remote: Option<RemoteToolRegistry>,
    state: StateCell,
    cancel: Arc<Mutex<CancellationToken>>,
    events: EventBus,
    logger: Arc<dyn Logger>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            cancel: Arc::clone(&self.cancel),
            state: self.state.clone(),
        }
    }

    /// Interrupt the turn in progress, if any
    pub fn interrupt(&self) {
        self.handle().interrupt();
    }

    pub fn state(&self) -> TurnState {
        self.state.get()
    }

    /// Whether a `chat` call is currently running
    pub fn is_turn_active(&self) -> bool {
        self.turn_active.load(Ordering::Acquire)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Prompter answering approval and continuation events, when enabled
    pub fn prompter(&self) -> Option<&ChannelPrompter> {
        self.prompter.as_ref()
    }

    pub fn rules(&self) -> &[ProjectRule] {
        &self.rules
    }

    /// Connect every configured remote server
    ///
    /// Failures and invalid config entries are published as warnings and
    /// returned; they never fail the agent.
    pub async fn connect_remote_tools(&self) -> Vec<ConnectFailure> {
        let Some(remote) = self.remote.as_ref() else {
            return Vec::new();
        };
        for issue in remote.config_issues() {
            self.events.publish(AgentEvent::warning("mcp-config", issue.clone()));
        }
        let failures = remote.ensure_connected_all().await;
        for failure in &failures {
            self.logger.warn(&format!(
                "[Agent] Remote server '{}' unavailable: {}",
                failure.server, failure.error
            ));
            self.events.publish(AgentEvent::warning(
                format!("mcp:{}", failure.server),
                failure.error.to_string(),
            ));
        }
        failures
    }

    pub fn messages(&self) -> Vec<Message> {
        self.session.lock().messages.clone()
    }

    /// Drop everything but system messages
    pub fn clear_history(&self) {
        self.session.lock().messages.retain(Message::is_system);
    }

    pub fn session_auto_approve(&self) -> bool {
        self.session.lock().session_auto_approve
    }

    pub fn set_session_auto_approve(&self, enabled: bool) {
        self.session.lock().session_auto_approve = enabled;
    }

    pub fn model(&self) -> String {
        self.session.lock().settings.model.clone()
    }

    /// Takes effect from the next completion request
    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.logger.info(&format!("[Agent] Model set to {}", model));
        self.session.lock().settings.model = model;
    }

    /// Replace the base system prompt in place
    pub fn set_system_prompt(&self, prompt: impl Into<String>) {
        self.session.lock().replace_system_prompt(prompt.into());
    }

    pub fn set_tool_filter(&self, filter: ToolFilter) {
        self.gateway.set_filter(filter);
    }

    /// Attach a rule by name (`name` or `name.mdc`); false if none matches
    pub fn attach_rule(&self, name: &str) -> bool {
        let Some(rule) = self.rules.iter().find(|r| r.is_named(name)) else {
            return false;
        };
        self.session.lock().push_system(rule.content.clone());
        true
    }

    /// Switch to an agent profile: model, temperature, prompt, tool scope
    /// and profile-scoped rules
    pub fn apply_profile(&self, profile: &AgentProfile) -> AgentResult<()> {
        let filter = profile.tool_filter().map_err(|e| AgentError::InvalidProfile {
            name: profile.name.clone(),
            message: e.to_string(),
        })?;

        {
            let mut session = self.session.lock();
            if let Some(ref model) = profile.model {
                session.settings.model = model.clone();
            }
            if profile.temperature.is_some() {
                session.settings.temperature = profile.temperature;
            }
            let prompt = profile
                .system
                .clone()
                .or_else(|| session.settings.system_prompt.clone())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
            session.system_prompt = prompt.clone();
            session.push_system(format!("Switched to agent profile: {}", profile.name));
            session.push_system(prompt);
            for rule in agent_rules(&self.rules, &profile.name) {
                session.push_system(rule.content.clone());
            }
            session.active_profile = Some(profile.name.clone());
        }
        self.gateway.set_filter(filter);
        self.logger
            .info(&format!("[Agent] Switched to agent profile {}", profile.name));
        Ok(())
    }

    pub fn active_profile(&self) -> Option<String> {
        self.session.lock().active_profile.clone()
    }

    /// Snapshot of this session's task list
    pub fn task_list(&self) -> Option<TaskList> {
        self.gateway.tasks().snapshot()
    }

    /// Run one chat turn
    ///
    /// Returns `Err` only for fatal conditions: missing or rejected
    /// credentials, or a turn already in progress.
    pub async fn chat(&self, input: &str) -> AgentResult<TurnOutcome> {
        let _turn = TurnGuard::acquire(&self.turn_active).ok_or(AgentError::TurnInProgress)?;
        let cancel = self.reset_cancel();

        let provider = self.ensure_provider()?;

        let max_iterations = {
            let mut session = self.session.lock();
            let input = self.apply_manual_rules(&mut session, input);
            session.messages.push(Message::user(input));
            log::debug(
                "agent::orchestrator",
                &format!("turn started, {} messages in history", session.messages.len()),
            );
            session.settings.max_iterations.max(1)
        };

        let mut touched = BTreeSet::new();
        let mut iteration = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Ok(self.finish_interrupted());
            }

            if iteration >= max_iterations {
                if !self.ask_to_continue(max_iterations, &cancel).await {
                    if cancel.is_cancelled() {
                        return Ok(self.finish_interrupted());
                    }
                    self.logger.info(&format!(
                        "[Agent] Stopped after {} iterations",
                        max_iterations
                    ));
                    self.state.set(TurnState::Done);
                    return Ok(TurnOutcome::IterationLimit { max_iterations });
                }
                iteration = 0;
            }

            self.state.set(TurnState::AwaitingCompletion);
            let request = self.build_request();

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                reply = provider.create_chat_completion(request, cancel.clone()) => Some(reply),
            };
            let response = match reply {
                None => return Ok(self.finish_interrupted()),
                Some(Err(ProviderError::Cancelled)) if cancel.is_cancelled() => {
                    return Ok(self.finish_interrupted());
                }
                Some(Err(e)) if e.is_unauthorized() => {
                    self.logger.error(&format!("[Agent] Credentials rejected: {}", e));
                    self.state.set(TurnState::Done);
                    return Err(AgentError::Unauthorized(format!(
                        "{e}. Please check your API key and try again."
                    )));
                }
                Some(Err(e)) => {
                    self.record_provider_error(&e);
                    iteration += 1;
                    continue;
                }
                Some(Ok(response)) => response,
            };

            if let Some(usage) = response.usage {
                self.events.publish(AgentEvent::Usage(usage));
            }

            let CompletionResponse { mut choices, .. } = response;
            if choices.is_empty() {
                let error = ProviderError::invalid_response(provider.name(), "response contained no choices");
                self.record_provider_error(&error);
                iteration += 1;
                continue;
            }
            let choice = choices.swap_remove(0);
            if let Some(reason) = choice.finish_reason.as_deref() {
                if reason != "stop" && reason != "tool_calls" {
                    self.logger
                        .warn(&format!("[Agent] Unexpected finish_reason: {}", reason));
                }
            }

            let message = choice.message;
            let calls = message.tool_calls().to_vec();
            if calls.is_empty() {
                let content = message.content().to_string();
                return Ok(self.finish_with_answer(&touched, content));
            }

            if !message.content().is_empty() || message.reasoning.is_some() {
                self.events.publish(AgentEvent::ThinkingText {
                    content: message.content().to_string(),
                    reasoning: message.reasoning.clone(),
                });
            }
            self.session
                .lock()
                .messages
                .push(Message::assistant_with_tool_calls(message.content(), calls.clone()));

            self.state.set(TurnState::ExecutingTools);
            if let Some(outcome) = self.run_tool_calls(&calls, &cancel, &mut touched).await {
                return Ok(outcome);
            }
            iteration += 1;
        }
    }

    fn build_request(&self) -> CompletionRequest {
        let tools = self.gateway.tool_schemas();
        let session = self.session.lock();
        CompletionRequest::new(session.settings.model.clone(), session.messages.clone())
            .with_tools(tools)
            .with_temperature(session.settings.temperature)
            .with_max_tokens(session.settings.max_tokens)
    }

    /// Execute a batch in model order; `Some` ends the turn
    async fn run_tool_calls(
        &self,
        calls: &[ToolCall],
        cancel: &CancellationToken,
        touched: &mut BTreeSet<String>,
    ) -> Option<TurnOutcome> {
        for call in calls {
            if cancel.is_cancelled() {
                return Some(self.finish_interrupted());
            }

            self.events.publish(AgentEvent::ToolStarted {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                arguments: call
                    .parse_arguments()
                    .unwrap_or_else(|_| Value::String(call.arguments.clone())),
            });

            let ctx = ExecutionContext::new(self.session_auto_approve(), cancel.clone());
            let outcome = self.gateway.execute_call(call, &ctx).await;

            if let Some(path) = outcome.touched_path.as_deref() {
                touched.insert(relative_to_root(self.gateway.project_root(), path));
            }
            self.events.publish(AgentEvent::ToolFinished {
                call_id: call.id.clone(),
                tool_name: outcome.tool_name.clone(),
                result: outcome.result.clone(),
            });

            {
                let mut session = self.session.lock();
                if outcome.enable_session_auto_approve && !session.session_auto_approve {
                    self.logger.info("[Agent] Session auto-approve enabled");
                    session.session_auto_approve = true;
                }
                session
                    .messages
                    .push(Message::tool(call.id.clone(), outcome.result.to_message_content()));
            }

            if outcome.result.user_rejected {
                if cancel.is_cancelled() {
                    return Some(self.finish_interrupted());
                }
                self.session.lock().push_system(rejection_note(&call.name));
                self.state.set(TurnState::Done);
                return Some(TurnOutcome::Rejected {
                    tool_name: outcome.tool_name,
                });
            }
        }
        None
    }

    async fn ask_to_continue(&self, max_iterations: usize, cancel: &CancellationToken) -> bool {
        let Some(decider) = self.continuation.as_ref() else {
            return false;
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            proceed = decider.should_continue(max_iterations) => proceed,
        }
    }

    fn ensure_provider(&self) -> AgentResult<Arc<dyn CompletionProvider>> {
        if let Some(ref provider) = self.session.lock().provider {
            return Ok(Arc::clone(provider));
        }
        let credentials = self.credentials.resolve().ok_or(AgentError::MissingCredentials)?;
        let provider = self.factory.create(&credentials, Arc::clone(&self.logger))?;
        self.logger.info(&format!(
            "[Agent] Using {} provider at {}",
            credentials.kind.as_str(),
            credentials.api_base
        ));
        self.session.lock().provider = Some(Arc::clone(&provider));
        Ok(provider)
    }

    fn apply_manual_rules(&self, session: &mut Session, input: &str) -> String {
        if self.rules.is_empty() {
            return input.to_string();
        }
        let (active, cleaned) = find_manual_rules(&self.rules, input);
        for rule in active {
            session.push_system(rule.content.clone());
        }
        cleaned
    }

    fn record_provider_error(&self, error: &ProviderError) {
        self.logger.warn(&format!("[Agent] Completion request failed: {}", error));
        self.session.lock().push_system(provider_error_note(error));
    }

    fn finish_with_answer(&self, touched: &BTreeSet<String>, content: String) -> TurnOutcome {
        let touched: Vec<&String> = touched.iter().collect();
        {
            let mut session = self.session.lock();
            for rule in auto_attach_rules(&self.rules, &touched) {
                let present = session
                    .messages
                    .iter()
                    .any(|m| m.is_system() && m.content == rule.content);
                if !present {
                    log::debug("agent::orchestrator", &format!("auto-attaching rule {}", rule.name));
                    session.push_system(rule.content.clone());
                }
            }
            session.messages.push(Message::assistant(content.clone()));
        }

        self.events.publish(AgentEvent::FinalMessage {
            content: content.clone(),
        });
        self.state.set(TurnState::Done);
        TurnOutcome::Completed { content }
    }

    fn finish_interrupted(&self) -> TurnOutcome {
        self.logger.info("[Agent] Turn interrupted by user");
        self.session.lock().push_system(INTERRUPTED_NOTE);
        self.state.set(TurnState::Interrupted);
        self.events.publish(AgentEvent::Interrupted);
        TurnOutcome::Interrupted
    }

    /// Fresh cancellation token for a new turn
    fn reset_cancel(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        token
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("state", &self.state())
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn relative_to_root(root: &Path, path: &str) -> String {
    Path::new(path)
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    settings: AgentSettings,
    local_tools: LocalToolRegistry,
    remote: Option<RemoteToolRegistry>,
    provider: Option<Arc<dyn CompletionProvider>>,
    factory: Option<Arc<dyn ProviderFactory>>,
    secrets: Option<Arc<dyn SecretStore>>,
    approver: Option<Arc<dyn Approver>>,
    continuation: Option<Arc<dyn ContinuationDecider>>,
    channel_prompts: bool,
    policy: ApprovalPolicy,
    filter: ToolFilter,
    rules: Vec<ProjectRule>,
    project_root: Option<PathBuf>,
    events: Option<EventBus>,
    logger: Arc<dyn Logger>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            settings: AgentSettings::default(),
            local_tools: LocalToolRegistry::with_task_tools(),
            remote: None,
            provider: None,
            factory: None,
            secrets: None,
            approver: None,
            continuation: None,
            channel_prompts: false,
            policy: ApprovalPolicy::new(),
            filter: ToolFilter::new(),
            rules: Vec::new(),
            project_root: None,
            events: None,
            logger: Arc::new(NoOpLogger),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Local tools; the task-list tools are always added
    pub fn with_local_tools(mut self, tools: LocalToolRegistry) -> Self {
        self.local_tools = tools;
        self
    }

    pub fn with_remote_registry(mut self, registry: RemoteToolRegistry) -> Self {
        self.remote = Some(registry);
        self
    }

    /// Use this provider instead of resolving credentials
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Secret store credentials are resolved from
    pub fn with_secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(store);
        self
    }

    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn with_continuation(mut self, decider: Arc<dyn ContinuationDecider>) -> Self {
        self.continuation = Some(decider);
        self
    }

    /// Route approval and continuation prompts through the event bus
    pub fn with_channel_prompts(mut self) -> Self {
        self.channel_prompts = true;
        self
    }

    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tool_filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_rules(mut self, rules: Vec<ProjectRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Agent {
        let events = self.events.unwrap_or_default();
        let state = StateCell::new(events.clone());

        let prompter = self.channel_prompts.then(|| ChannelPrompter::new(events.clone()));
        let approver: Option<Arc<dyn Approver>> = self
            .approver
            .or_else(|| prompter.clone().map(|p| Arc::new(p) as Arc<dyn Approver>));
        let continuation: Option<Arc<dyn ContinuationDecider>> = self
            .continuation
            .or_else(|| prompter.clone().map(|p| Arc::new(p) as Arc<dyn ContinuationDecider>));

        let mut local_tools = self.local_tools;
        let task_tools = LocalToolRegistry::with_task_tools();
        for name in task_tools.names() {
            if let Some(tool) = task_tools.get(&name).filter(|_| !local_tools.contains(&name)) {
                local_tools.register(tool);
            }
        }

        let project_root = self.project_root.unwrap_or_else(|| detect_project_root("."));
        let mut gateway = ToolGateway::new(local_tools, project_root, Arc::clone(&self.logger))
            .with_policy(self.policy)
            .with_filter(self.filter);
        if let Some(remote) = self.remote.clone() {
            gateway = gateway.with_remote(remote);
        }
        if let Some(inner) = approver {
            gateway = gateway.with_approver(Arc::new(StateTrackingApprover {
                inner,
                state: state.clone(),
            }));
        }

        let system_prompt = self
            .settings
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let mut messages: Vec<Message> = self
            .rules
            .iter()
            .filter(|rule| rule.always_apply)
            .map(|rule| Message::system(rule.content.clone()))
            .collect();
        messages.push(Message::system(system_prompt.clone()));

        let factory = self.factory.unwrap_or_else(|| {
            let timeout = self.settings.request_timeout_ms.map(std::time::Duration::from_millis);
            Arc::new(HttpProviderFactory::new().with_timeout(timeout))
        });
        let credentials = match self.secrets {
            Some(store) => CredentialResolver::new(store),
            None => CredentialResolver::default(),
        };

        Agent {
            session: Mutex::new(Session {
                settings: self.settings,
                messages,
                provider: self.provider,
                session_auto_approve: false,
                system_prompt,
                active_profile: None,
            }),
            turn_active: AtomicBool::new(false),
            gateway,
            rules: self.rules,
            factory,
            credentials,
            continuation,
            prompter,
            remote: self.remote,
            state,
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            events,
            logger: self.logger,
        }
    }
}
