//! System keychain secret store (macOS Keychain, Windows Credential
//! Manager, Secret Service on Linux)

use keyring::Entry;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::logging::file_logger as log;

/// Secret store backed by the OS keychain under a service name
pub struct KeychainSecretStore {
    service_name: String,
}

impl KeychainSecretStore {
    /// Keychain store under the "nexus" service
    pub fn new() -> Self {
        Self::with_service("nexus")
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service_name: service.into(),
        }
    }

    fn entry(&self, key: &str) -> SecretStoreResult<Entry> {
        Entry::new(&self.service_name, key)
            .map_err(|e| SecretStoreError::Other(format!("Failed to create keychain entry: {}", e)))
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    fn name(&self) -> &str {
        "keychain"
    }

    fn is_available(&self) -> bool {
        match Entry::new(&self.service_name, "__nexus_availability_check__") {
            Ok(_) => true,
            Err(e) => {
                log::debug("KeychainSecretStore", &format!("keychain unavailable: {:?}", e));
                false
            }
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let entry = self.entry(key).ok()?;
        match entry.get_password() {
            Ok(password) if !password.is_empty() => Some(password),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                log::warn("KeychainSecretStore", &format!("get('{}') failed: {:?}", key, e));
                None
            }
        }
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SecretStoreError::Other(format!("Failed to store in keychain: {}", e)))
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Other(format!("Failed to delete from keychain: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires system keychain
    fn test_store_and_get() {
        let store = KeychainSecretStore::with_service("nexus-test");
        let _ = store.delete("test_key");

        store.store("test_key", "test_value").unwrap();
        assert_eq!(store.get("test_key"), Some("test_value".to_string()));

        store.delete("test_key").unwrap();
        assert_eq!(store.get("test_key"), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(KeychainSecretStore::new().name(), "keychain");
    }
}
