//! Turn state machine
//!
//! ```text
//! Idle ─► AwaitingCompletion ─► ExecutingTools ─► AwaitingCompletion ─► … ─► Done
//!                                    │  ▲
//!                                    ▼  │
//!                             AwaitingApproval
//! any state ─► Interrupted
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{AgentEvent, EventBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    Idle,
    AwaitingCompletion,
    ExecutingTools,
    AwaitingApproval,
    Done,
    Interrupted,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Done | TurnState::Interrupted)
    }
}

/// How a chat turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced a final answer
    Completed { content: String },
    /// The user declined a tool call; the rest of the batch was skipped
    Rejected { tool_name: String },
    /// The iteration cap was hit and continuing was declined
    IterationLimit { max_iterations: usize },
    Interrupted,
}

/// Current state, shared with the approval adapter
///
/// Every transition is published as [`AgentEvent::StateChanged`].
#[derive(Debug, Clone)]
pub(crate) struct StateCell {
    state: Arc<Mutex<TurnState>>,
    events: EventBus,
}

impl StateCell {
    pub(crate) fn new(events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(TurnState::Idle)),
            events,
        }
    }

    pub(crate) fn get(&self) -> TurnState {
        *self.state.lock()
    }

    pub(crate) fn set(&self, to: TurnState) {
        let from = std::mem::replace(&mut *self.state.lock(), to);
        if from != to {
            self.events.publish(AgentEvent::StateChanged { from, to });
        }
    }
}
