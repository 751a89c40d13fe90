//! Completion providers
//!
//! The agent only depends on [`CompletionProvider`]. Credentials are
//! resolved lazily on the first turn and turned into a provider by a
//! [`ProviderFactory`]; the default factory builds an
//! [`OpenAiCompatibleProvider`] for either OpenAI or Groq.

mod traits;
mod error;
mod credentials;
mod openai_compat;
mod mock;

pub use traits::{AssistantMessage, Choice, CompletionProvider, CompletionRequest, CompletionResponse, Usage};
pub use error::{ProviderError, ProviderResult};
pub use credentials::{CredentialResolver, Credentials, HttpProviderFactory, ProviderFactory, ProviderKind};
pub use openai_compat::{OpenAiCompatibleProvider, GROQ_API_BASE, OPENAI_API_BASE};
pub use mock::{MockProvider, MockReply, StaticProviderFactory};
