//! Core traits and types for secret storage

use thiserror::Error;

/// Errors that can occur during secret store operations
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Store not available: {0}")]
    NotAvailable(String),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Where an API key or endpoint comes from
///
/// Keys are the literal variable names (`OPENAI_API_KEY`, `GROQ_API_KEY`,
/// `OPENAI_BASE_URL`); provider aliases such as `openai` are also accepted
/// by the environment store.
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Whether this store can be used at all (a keychain may be missing on
    /// a headless machine)
    fn is_available(&self) -> bool {
        true
    }

    /// Retrieve a secret by key; empty values count as absent
    fn get(&self, key: &str) -> Option<String>;

    /// Store a secret
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    /// Delete a secret
    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
