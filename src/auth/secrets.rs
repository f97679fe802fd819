//! Where token material lives
//!
//! The cache file only keeps account metadata. Access and refresh tokens go
//! through a `SecretStore`, which is the OS credential store in the CLI.

use crate::error::{DynamicsError, Result};
use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;

pub const KEYRING_SERVICE: &str = "dynamics-crm";

pub trait SecretStore: Send + Sync {
    fn store(&self, key: &str, secret: &str) -> Result<()>;

    /// `None` when nothing is stored under `key`
    fn retrieve(&self, key: &str) -> Result<Option<String>>;

    /// Returns whether a secret was removed
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Keychain, Credential Manager or the kernel keyring, depending on platform
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(DynamicsError::from)
    }
}

impl SecretStore for KeyringStore {
    fn store(&self, key: &str, secret: &str) -> Result<()> {
        self.entry(key)?.set_password(secret)?;
        debug!("Stored secret {} in keyring", key);
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local store for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn store(&self, key: &str, secret: &str) -> Result<()> {
        self.entries().insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries().remove(key).is_some())
    }
}
