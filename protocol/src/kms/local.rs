//! In-process key management backed by the identifier store.
//!
//! Private keys are sealed with AES-256-GCM before they touch disk. The
//! sealing key is derived from the operator's 32-byte KMS secret with
//! BLAKE3 `derive_key`, and every sealed blob is bound to its kid through
//! the associated data.
//!
//! The kid is the lowercase hex public key, so a key's handle is stable and
//! can be recomputed from the public half alone.

use async_trait::async_trait;
use tracing::debug;

use super::{KeyManagementSystem, KmsError};
use crate::config::{AES_KEY_LENGTH, DEFAULT_KMS, KMS_SEAL_CONTEXT};
use crate::crypto::encryption::{key_from_slice, open, seal};
use crate::crypto::{derive_key, KeyMaterial, KeyType};
use crate::identity::{Key, KeyMeta};
use crate::storage::DidStore;

/// Local key management backend.
pub struct LocalKeyManagementSystem {
    name: String,
    store: DidStore,
    seal_key: [u8; AES_KEY_LENGTH],
}

impl LocalKeyManagementSystem {
    /// Create a backend registered under [`DEFAULT_KMS`].
    pub fn new(store: DidStore, secret: &[u8; AES_KEY_LENGTH]) -> Self {
        Self::with_name(DEFAULT_KMS, store, secret)
    }

    pub fn with_name(name: &str, store: DidStore, secret: &[u8; AES_KEY_LENGTH]) -> Self {
        Self {
            name: name.to_string(),
            store,
            seal_key: derive_key(KMS_SEAL_CONTEXT, secret),
        }
    }

    /// Create a backend from a hex-encoded 32-byte secret.
    pub fn from_secret_hex(store: DidStore, secret_hex: &str) -> Result<Self, KmsError> {
        let bytes = hex::decode(secret_hex.trim_start_matches("0x"))
            .map_err(|e| KmsError::InvalidSecret(e.to_string()))?;
        let secret = key_from_slice(&bytes)
            .map_err(|_| KmsError::InvalidSecret(format!("expected {AES_KEY_LENGTH} bytes")))?;
        Ok(Self::new(store, &secret))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unseal the private key stored for `kid`.
    pub fn load_key_material(&self, kid: &str, key_type: KeyType) -> Result<KeyMaterial, KmsError> {
        let sealed = self
            .store
            .get_private_key(kid)?
            .ok_or_else(|| KmsError::UnknownKid(kid.to_string()))?;
        let secret = open(&self.seal_key, &sealed, kid.as_bytes())?;
        Ok(KeyMaterial::from_secret(key_type, &secret)?)
    }

    fn store_material(&self, material: KeyMaterial) -> Result<Key, KmsError> {
        let kid = material.public_key_hex();
        let sealed = seal(&self.seal_key, material.secret_key_bytes(), kid.as_bytes())?;
        self.store.put_private_key(&kid, &sealed)?;

        let key_type = material.key_type();
        debug!(kms = %self.name, %key_type, %kid, "key stored");

        Ok(Key {
            kid: kid.clone(),
            kms: self.name.clone(),
            key_type,
            public_key_hex: kid,
            meta: Some(KeyMeta {
                algorithms: key_type.algorithms(),
            }),
        })
    }
}

#[async_trait]
impl KeyManagementSystem for LocalKeyManagementSystem {
    async fn create_key(&self, key_type: KeyType) -> Result<Key, KmsError> {
        self.store_material(KeyMaterial::generate(key_type))
    }

    async fn import_key(&self, key_type: KeyType, secret: &[u8]) -> Result<Key, KmsError> {
        self.store_material(KeyMaterial::from_secret(key_type, secret)?)
    }

    async fn delete_key(&self, kid: &str) -> Result<bool, KmsError> {
        let removed = self.store.remove_private_key(kid)?;
        debug!(kms = %self.name, %kid, removed, "key deleted");
        Ok(removed)
    }
}
