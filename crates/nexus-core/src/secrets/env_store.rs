//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Provider aliases understood by the store
static PROVIDER_ENV_VARS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("openai", "OPENAI_API_KEY");
    m.insert("groq", "GROQ_API_KEY");
    m
});

/// Read-only secret store backed by the process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// Environment variable holding the key for a provider alias
    pub fn env_var_for_provider(provider: &str) -> Option<&'static str> {
        PROVIDER_ENV_VARS.get(provider.to_lowercase().as_str()).copied()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        non_empty_var(key).or_else(|| Self::env_var_for_provider(key).and_then(non_empty_var))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_store_read_only() {
        let store = EnvSecretStore::new();
        assert_eq!(store.name(), "env");
        assert!(matches!(store.store("k", "v"), Err(SecretStoreError::ReadOnly)));
        assert!(matches!(store.delete("k"), Err(SecretStoreError::ReadOnly)));
    }

    #[test]
    fn test_env_store_get_direct_and_empty() {
        env::set_var("NEXUS_TEST_SECRET_A", "value");
        env::set_var("NEXUS_TEST_SECRET_EMPTY", "  ");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("NEXUS_TEST_SECRET_A"), Some("value".to_string()));
        assert_eq!(store.get("NEXUS_TEST_SECRET_EMPTY"), None);

        env::remove_var("NEXUS_TEST_SECRET_A");
        env::remove_var("NEXUS_TEST_SECRET_EMPTY");
    }

    #[test]
    fn test_provider_alias() {
        assert_eq!(EnvSecretStore::env_var_for_provider("Groq"), Some("GROQ_API_KEY"));
        assert_eq!(EnvSecretStore::env_var_for_provider("mistral"), None);
    }
}
