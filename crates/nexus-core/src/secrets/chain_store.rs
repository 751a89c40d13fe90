//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Reads from each store in order and returns the first hit; writes go to
/// the first available writable store
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    /// Environment first, then the system keychain
    pub fn default_chain() -> Self {
        Self::new(vec![
            Arc::new(super::EnvSecretStore::new()),
            Arc::new(super::KeychainSecretStore::new()),
        ])
    }

    /// Name of the store that would answer `get(key)`
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.stores
            .iter()
            .find(|s| s.is_available() && s.has(key))
            .map(|s| s.name())
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        let mut last_error = SecretStoreError::NotAvailable("no store in chain".to_string());
        for store in self.stores.iter().filter(|s| s.is_available()) {
            match store.store(key, value) {
                Ok(()) => return Ok(()),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        for store in self.stores.iter().filter(|s| s.is_available()) {
            match store.delete(key) {
                Ok(()) | Err(SecretStoreError::ReadOnly) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
