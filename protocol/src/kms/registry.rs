//! Named registry of key management backends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{KeyManagementSystem, KeyMaterialProvider, KmsError};
use crate::crypto::KeyType;
use crate::identity::Key;

/// Dispatches key generation to the backend named by the caller.
#[derive(Default, Clone)]
pub struct KeyManager {
    backends: HashMap<String, Arc<dyn KeyManagementSystem>>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kms` under `name`, replacing any previous backend.
    pub fn register(&mut self, name: impl Into<String>, kms: Arc<dyn KeyManagementSystem>) {
        self.backends.insert(name.into(), kms);
    }

    pub fn with_backend(mut self, name: impl Into<String>, kms: Arc<dyn KeyManagementSystem>) -> Self {
        self.register(name, kms);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn KeyManagementSystem>, KmsError> {
        self.backends
            .get(name)
            .ok_or_else(|| KmsError::UnknownBackend(name.to_string()))
    }

    /// Registered backend names, sorted.
    pub fn backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl KeyMaterialProvider for KeyManager {
    async fn generate_key(&self, key_type: KeyType, kms: &str) -> Result<Key, KmsError> {
        self.get(kms)?.create_key(key_type).await
    }

    async fn discard_key(&self, key: &Key) -> Result<(), KmsError> {
        self.get(&key.kms)?.delete_key(&key.kid).await?;
        Ok(())
    }
}
