//! # Key Management
//!
//! Key material provision for identifier construction. The construction
//! engine asks for a key of a given [`KeyType`] from a named backend and gets
//! back a [`Key`]: public half plus an opaque kid. Private bytes never leave
//! the backend.
//!
//! ```text
//! ValyuDidProvider ──▶ KeyMaterialProvider (KeyManager)
//!                          │ "local"
//!                          ▼
//!                      KeyManagementSystem (LocalKeyManagementSystem)
//!                          │ seal(secret, aad = kid)
//!                          ▼
//!                      DidStore.private_keys
//! ```

pub mod local;
pub mod registry;

pub use local::LocalKeyManagementSystem;
pub use registry::KeyManager;

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::encryption::EncryptionError;
use crate::crypto::keys::KeyError;
use crate::crypto::KeyType;
use crate::identity::Key;
use crate::storage::StoreError;

/// Errors from key management backends.
#[derive(Debug, Error)]
pub enum KmsError {
    #[error("unknown key management system: {0}")]
    UnknownBackend(String),

    #[error("no private key stored for kid {0}")]
    UnknownKid(String),

    #[error("invalid KMS secret: {0}")]
    InvalidSecret(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("key sealing failed: {0}")]
    Seal(#[from] EncryptionError),

    #[error("key store error: {0}")]
    Storage(#[from] StoreError),
}

/// What the construction engine needs from key management.
#[async_trait]
pub trait KeyMaterialProvider: Send + Sync {
    /// Generate a fresh key pair of `key_type` in the backend named `kms`.
    async fn generate_key(&self, key_type: KeyType, kms: &str) -> Result<Key, KmsError>;

    /// Drop the private half of a key that never made it into a saved
    /// identifier. The backend is taken from `key.kms`.
    async fn discard_key(&self, key: &Key) -> Result<(), KmsError>;
}

/// A single key management backend.
#[async_trait]
pub trait KeyManagementSystem: Send + Sync {
    /// Generate and store a new key pair.
    async fn create_key(&self, key_type: KeyType) -> Result<Key, KmsError>;

    /// Store an existing private key and return its public reference.
    async fn import_key(&self, key_type: KeyType, secret: &[u8]) -> Result<Key, KmsError>;

    /// Delete the private key stored for `kid`. Returns whether one existed.
    async fn delete_key(&self, kid: &str) -> Result<bool, KmsError>;
}
