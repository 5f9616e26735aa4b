//! Secret store contract.
//!
//! The core needs get/set/delete by key and nothing else; where secrets
//! physically live (OS keychain, encrypted file) is the embedding
//! application's concern. The core never logs or persists secret values.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dirsync_domain::Result;
use tokio::sync::RwLock;

/// Keyed secret storage used for client secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store or replace a secret.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a secret; deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory secret store for tests and embedding without OS integration.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemorySecretStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
