//! Approval and continuation prompts over the event bus
//!
//! A prompt suspends the turn: the prompter publishes an event carrying a
//! [`PromptToken`] and waits on a oneshot channel. The UI resumes the turn
//! by answering the token through [`ChannelPrompter`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::events::{AgentEvent, EventBus, PromptToken};
use crate::tools::{ApprovalDecision, Approver};

/// Decides whether to keep going once the iteration cap is reached
#[async_trait]
pub trait ContinuationDecider: Send + Sync {
    async fn should_continue(&self, max_iterations: usize) -> bool;
}

enum PendingPrompt {
    Approval(oneshot::Sender<ApprovalDecision>),
    Continuation(oneshot::Sender<bool>),
}

struct PrompterInner {
    events: EventBus,
    next_token: AtomicU64,
    pending: Mutex<HashMap<PromptToken, PendingPrompt>>,
}

/// Removes an abandoned prompt when its waiter is dropped
struct PendingGuard<'a> {
    inner: &'a PrompterInner,
    token: PromptToken,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending.lock().remove(&self.token);
    }
}

/// Event-driven [`Approver`] and [`ContinuationDecider`]
///
/// With no event subscribers nobody can answer, so prompts resolve to
/// rejection / stop immediately.
#[derive(Clone)]
pub struct ChannelPrompter {
    inner: Arc<PrompterInner>,
}

impl ChannelPrompter {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: Arc::new(PrompterInner {
                events,
                next_token: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Answer an approval prompt; false if the token is unknown or stale
    pub fn respond_approval(&self, token: PromptToken, decision: ApprovalDecision) -> bool {
        let mut pending = self.inner.pending.lock();
        match pending.remove(&token) {
            Some(PendingPrompt::Approval(tx)) => tx.send(decision).is_ok(),
            Some(other) => {
                pending.insert(token, other);
                false
            }
            None => false,
        }
    }

    /// Answer a continuation prompt
    pub fn respond_continuation(&self, token: PromptToken, proceed: bool) -> bool {
        let mut pending = self.inner.pending.lock();
        match pending.remove(&token) {
            Some(PendingPrompt::Continuation(tx)) => tx.send(proceed).is_ok(),
            Some(other) => {
                pending.insert(token, other);
                false
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    fn next_token(&self) -> PromptToken {
        PromptToken(self.inner.next_token.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Approver for ChannelPrompter {
    async fn request_approval(&self, tool_name: &str, arguments: &Value) -> ApprovalDecision {
        if self.inner.events.subscriber_count() == 0 {
            return ApprovalDecision::reject();
        }
        let token = self.next_token();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(token, PendingPrompt::Approval(tx));
        let _guard = PendingGuard {
            inner: &self.inner,
            token,
        };

        self.inner.events.publish(AgentEvent::ApprovalRequested {
            token,
            tool_name: tool_name.to_string(),
            arguments: arguments.clone(),
        });
        rx.await.unwrap_or_default()
    }
}

#[async_trait]
impl ContinuationDecider for ChannelPrompter {
    async fn should_continue(&self, max_iterations: usize) -> bool {
        if self.inner.events.subscriber_count() == 0 {
            return false;
        }
        let token = self.next_token();
        let (tx, rx) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .insert(token, PendingPrompt::Continuation(tx));
        let _guard = PendingGuard {
            inner: &self.inner,
            token,
        };

        self.inner.events.publish(AgentEvent::ContinuationRequested { token, max_iterations });
        rx.await.unwrap_or(false)
    }
}

impl std::fmt::Debug for ChannelPrompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPrompter")
            .field("pending", &self.pending_count())
            .finish()
    }
}
