//! Stored identifier records.
//!
//! These are the authoritative shapes persisted by the identifier store.
//! DID Documents are projections of them (see [`super::document`]).
//!
//! No field uses `skip_serializing_if`: records go through bincode, which
//! needs every field present on both ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::KeyType;

/// Extra data the key management backend attaches to a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMeta {
    /// Operations the key is usable for.
    pub algorithms: Vec<String>,
}

/// A reference to a key held by a key management backend.
///
/// Carries the public half only. `kms` names the backend that holds the
/// private half; `kid` is that backend's handle for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub kid: String,
    pub kms: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub public_key_hex: String,
    pub meta: Option<KeyMeta>,
}

/// A service endpoint attached to an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// The root record for a did:valyu identifier.
///
/// `keys` is order-significant: index 0 is the primary key (its kid is
/// `controller_key_id`), index 1 the key-agreement key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub did: String,
    pub alias: Option<String>,
    pub provider: String,
    pub controller_key_id: String,
    pub keys: Vec<Key>,
    pub services: Vec<Service>,
    pub created_at: DateTime<Utc>,
}

impl Identifier {
    /// The primary (signing / token-binding) key, if present.
    pub fn primary_key(&self) -> Option<&Key> {
        self.keys.first()
    }

    /// The key-agreement key, if present.
    pub fn agreement_key(&self) -> Option<&Key> {
        self.keys.get(1)
    }
}
