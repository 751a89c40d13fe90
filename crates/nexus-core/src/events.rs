//! Typed lifecycle events and the broadcast bus they travel on
//!
//! Any number of consumers (UI, logger, test harness) subscribe
//! independently. Publishing never blocks; a lagging subscriber loses the
//! oldest events.

use serde_json::Value;
use tokio::sync::broadcast;

use crate::agent::TurnState;
use crate::providers::Usage;
use crate::types::ToolResult;

/// Identifies one outstanding prompt (approval or continuation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromptToken(pub u64);

impl std::fmt::Display for PromptToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prompt-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    StateChanged {
        from: TurnState,
        to: TurnState,
    },
    ToolStarted {
        call_id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolFinished {
        call_id: String,
        tool_name: String,
        result: ToolResult,
    },
    /// The turn is suspended until `token` is answered
    ApprovalRequested {
        token: PromptToken,
        tool_name: String,
        arguments: Value,
    },
    /// The iteration cap was reached; answer `token` to go on or stop
    ContinuationRequested {
        token: PromptToken,
        max_iterations: usize,
    },
    /// Text or reasoning sent alongside tool calls
    ThinkingText {
        content: String,
        reasoning: Option<String>,
    },
    FinalMessage {
        content: String,
    },
    Usage(Usage),
    /// Non-fatal problem a user should see
    Warning {
        source: String,
        message: String,
    },
    Interrupted,
}

impl AgentEvent {
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Warning {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Fan-out channel for [`AgentEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
}

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every current subscriber
    pub fn publish(&self, event: AgentEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AgentEvent::warning("mcp", "server fs failed"));
        bus.publish(AgentEvent::Interrupted);

        assert_eq!(first.recv().await.unwrap(), AgentEvent::warning("mcp", "server fs failed"));
        assert_eq!(first.recv().await.unwrap(), AgentEvent::Interrupted);
        assert_eq!(second.recv().await.unwrap(), AgentEvent::warning("mcp", "server fs failed"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(AgentEvent::Interrupted);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
