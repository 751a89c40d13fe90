//! Conversation orchestration
//!
//! ```rust,ignore
//! use nexus_core::agent::{Agent, TurnOutcome};
//!
//! let agent = Agent::builder()
//!     .with_settings(AgentSettings::load()?)
//!     .with_channel_prompts()
//!     .build();
//! agent.connect_remote_tools().await;
//!
//! match agent.chat("@style tidy up src/main.rs").await? {
//!     TurnOutcome::Completed { content } => println!("{content}"),
//!     other => println!("turn ended: {other:?}"),
//! }
//! ```

mod approval;
mod error;
mod orchestrator;
mod profile;
mod rules;
mod state;

pub use approval::{ChannelPrompter, ContinuationDecider};
pub use error::{AgentError, AgentResult};
pub use orchestrator::{Agent, AgentBuilder, AgentHandle, DEFAULT_SYSTEM_PROMPT, INTERRUPTED_NOTE};
pub use profile::AgentProfile;
pub use rules::{agent_rules, auto_attach_rules, find_manual_rules, rule_refs, ProjectRule};
pub use state::{TurnOutcome, TurnState};
