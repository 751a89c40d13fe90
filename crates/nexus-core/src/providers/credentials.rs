//! Provider credential resolution and provider construction

use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::openai_compat::{OpenAiCompatibleProvider, GROQ_API_BASE, OPENAI_API_BASE};
use super::traits::CompletionProvider;
use crate::logging::Logger;
use crate::secrets::{ChainSecretStore, SecretStore};

/// Which backend a set of credentials talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI or any server speaking its API
    OpenAiCompatible,
    Groq,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "openai",
            ProviderKind::Groq => "groq",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub kind: ProviderKind,
    pub api_key: String,
    pub api_base: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Finds the first usable credentials in a secret store
///
/// Order: `OPENAI_API_KEY` (with optional `OPENAI_BASE_URL`), then
/// `GROQ_API_KEY`.
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self) -> Option<Credentials> {
        if let Some(api_key) = self.store.get("OPENAI_API_KEY") {
            let api_base = self
                .store
                .get("OPENAI_BASE_URL")
                .unwrap_or_else(|| OPENAI_API_BASE.to_string());
            return Some(Credentials {
                kind: ProviderKind::OpenAiCompatible,
                api_key,
                api_base,
            });
        }
        self.store.get("GROQ_API_KEY").map(|api_key| Credentials {
            kind: ProviderKind::Groq,
            api_key,
            api_base: GROQ_API_BASE.to_string(),
        })
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(Arc::new(ChainSecretStore::default_chain()))
    }
}

/// Builds a completion provider from resolved credentials
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        credentials: &Credentials,
        logger: Arc<dyn Logger>,
    ) -> ProviderResult<Arc<dyn CompletionProvider>>;
}

/// Creates [`OpenAiCompatibleProvider`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProviderFactory {
    timeout: Option<Duration>,
}

impl HttpProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole-request timeout for created providers
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        credentials: &Credentials,
        logger: Arc<dyn Logger>,
    ) -> ProviderResult<Arc<dyn CompletionProvider>> {
        if credentials.api_key.trim().is_empty() {
            return Err(ProviderError::missing_api_key(credentials.kind.as_str()));
        }
        let provider = OpenAiCompatibleProvider::new(
            credentials.kind.as_str(),
            credentials.api_base.clone(),
            credentials.api_key.clone(),
            logger,
        );
        let provider = match self.timeout {
            Some(timeout) => provider.with_timeout(timeout)?,
            None => provider,
        };
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_openai_wins_over_groq() {
        let store = MemorySecretStore::new()
            .with_secret("GROQ_API_KEY", "gsk-1")
            .with_secret("OPENAI_API_KEY", "sk-1")
            .with_secret("OPENAI_BASE_URL", "http://localhost:8080/v1");
        let credentials = CredentialResolver::new(Arc::new(store)).resolve().unwrap();

        assert_eq!(credentials.kind, ProviderKind::OpenAiCompatible);
        assert_eq!(credentials.api_key, "sk-1");
        assert_eq!(credentials.api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn test_groq_fallback_and_none() {
        let groq = MemorySecretStore::new().with_secret("GROQ_API_KEY", "gsk-1");
        let credentials = CredentialResolver::new(Arc::new(groq)).resolve().unwrap();
        assert_eq!(credentials.kind, ProviderKind::Groq);
        assert_eq!(credentials.api_base, GROQ_API_BASE);

        assert!(CredentialResolver::new(Arc::new(MemorySecretStore::new())).resolve().is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let credentials = Credentials {
            kind: ProviderKind::Groq,
            api_key: "gsk-secret".to_string(),
            api_base: GROQ_API_BASE.to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("gsk-secret"));
    }

    #[test]
    fn test_factory_builds_named_provider() {
        let credentials = Credentials {
            kind: ProviderKind::Groq,
            api_key: "gsk-1".to_string(),
            api_base: GROQ_API_BASE.to_string(),
        };
        let provider = HttpProviderFactory::new().create(&credentials, Arc::new(NoOpLogger)).unwrap();
        assert_eq!(provider.name(), "groq");
    }
}
