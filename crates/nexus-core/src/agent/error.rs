//! Errors a chat turn can end with

use thiserror::Error;

use crate::providers::ProviderError;

/// Fatal turn errors
///
/// Everything else (tool failures, recoverable provider errors, rejected
/// approvals) is handled inside the turn.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("No API key configured. Set OPENAI_API_KEY or GROQ_API_KEY, or store one in the system keychain.")]
    MissingCredentials,

    /// The provider rejected the credentials; never retried
    #[error("{0}")]
    Unauthorized(String),

    #[error("A chat turn is already in progress")]
    TurnInProgress,

    #[error("Failed to create completion provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid agent profile '{name}': {message}")]
    InvalidProfile { name: String, message: String },
}

pub type AgentResult<T> = Result<T, AgentError>;
