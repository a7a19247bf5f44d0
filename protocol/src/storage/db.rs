//! # DidStore: Persistent Identifier Storage
//!
//! The persistence layer for did:valyu, built on sled's embedded key-value
//! store.
//!
//! ## Tree Layout
//!
//! | Tree           | Key                | Value                        |
//! |----------------|--------------------|------------------------------|
//! | `identifiers`  | `did` (UTF-8)      | `bincode(Identifier)`        |
//! | `aliases`      | `alias` (UTF-8)    | `did` (UTF-8)                |
//! | `private_keys` | `kid` (UTF-8)      | `nonce \|\| AES-GCM(secret)` |
//!
//! Keys and services are stored inline in the identifier record, so a load
//! always returns the complete record with its original ordering.
//!
//! ## Atomicity
//!
//! Inserting an identifier writes `identifiers` and `aliases` in a single
//! sled transaction. The DID and alias checks run inside it, so two
//! concurrent inserts with the same DID or alias cannot both succeed.

use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use std::path::Path;
use tracing::debug;

use super::store::IdentifierStore;
use crate::identity::Identifier;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("identifier already exists: {0}")]
    DuplicateDid(String),

    #[error("alias already in use: {0}")]
    DuplicateAlias(String),

    #[error("identifier not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => StoreError::Sled(e),
        }
    }
}

fn encode(identifier: &Identifier) -> StoreResult<Vec<u8>> {
    bincode::serialize(identifier).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> StoreResult<Identifier> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn abort<T>(err: StoreError) -> Result<T, ConflictableTransactionError<StoreError>> {
    Err(ConflictableTransactionError::Abort(err))
}

// ---------------------------------------------------------------------------
// DidStore
// ---------------------------------------------------------------------------

/// sled-backed identifier store.
///
/// Cheap to clone; clones share the same database. sled trees support
/// concurrent reads and serialized writes, so `DidStore` can be shared
/// across tasks without external locking.
#[derive(Debug, Clone)]
pub struct DidStore {
    db: Db,
    identifiers: Tree,
    aliases: Tree,
    private_keys: Tree,
}

impl DidStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary store that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let identifiers = db.open_tree("identifiers")?;
        let aliases = db.open_tree("aliases")?;
        let private_keys = db.open_tree("private_keys")?;

        Ok(Self {
            db,
            identifiers,
            aliases,
            private_keys,
        })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // -- Identifier records -------------------------------------------------

    /// Insert a new identifier. Fails if the DID or alias is taken.
    pub fn insert_identifier(&self, identifier: &Identifier) -> StoreResult<()> {
        let bytes = encode(identifier)?;
        let did = identifier.did.as_str();
        let alias = identifier.alias.as_deref();

        (&self.identifiers, &self.aliases).transaction(|(ids, aliases)| {
            if ids.get(did)?.is_some() {
                return abort(StoreError::DuplicateDid(did.to_string()));
            }
            if let Some(alias) = alias {
                if aliases.get(alias)?.is_some() {
                    return abort(StoreError::DuplicateAlias(alias.to_string()));
                }
                aliases.insert(alias, did)?;
            }
            ids.insert(did, bytes.as_slice())?;
            Ok(())
        })?;

        debug!(did, "identifier inserted");
        Ok(())
    }

    /// Replace an existing identifier, keeping the alias index in step.
    pub fn replace_identifier(&self, identifier: &Identifier) -> StoreResult<()> {
        let bytes = encode(identifier)?;
        let did = identifier.did.as_str();
        let new_alias = identifier.alias.as_deref();

        (&self.identifiers, &self.aliases).transaction(|(ids, aliases)| {
            let Some(existing) = ids.get(did)? else {
                return abort(StoreError::NotFound(did.to_string()));
            };
            let existing = match decode(&existing) {
                Ok(record) => record,
                Err(e) => return abort(e),
            };

            let old_alias = existing.alias.as_deref();
            if old_alias != new_alias {
                if let Some(alias) = new_alias {
                    if aliases.get(alias)?.is_some() {
                        return abort(StoreError::DuplicateAlias(alias.to_string()));
                    }
                    aliases.insert(alias, did)?;
                }
                if let Some(alias) = old_alias {
                    aliases.remove(alias)?;
                }
            }

            ids.insert(did, bytes.as_slice())?;
            Ok(())
        })?;

        debug!(did, "identifier replaced");
        Ok(())
    }

    /// Load an identifier by DID.
    pub fn get_identifier(&self, did: &str) -> StoreResult<Option<Identifier>> {
        match self.identifiers.get(did)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load an identifier through the alias index.
    pub fn get_identifier_by_alias(&self, alias: &str) -> StoreResult<Option<Identifier>> {
        let Some(did) = self.aliases.get(alias)? else {
            return Ok(None);
        };
        let did = String::from_utf8(did.to_vec())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.get_identifier(&did)
    }

    /// All identifiers, ordered by DID.
    pub fn all_identifiers(&self) -> StoreResult<Vec<Identifier>> {
        self.identifiers
            .iter()
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }

    /// Number of stored identifiers.
    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    // -- Private keys -------------------------------------------------------

    /// Store a sealed private key under its kid.
    pub fn put_private_key(&self, kid: &str, sealed: &[u8]) -> StoreResult<()> {
        self.private_keys.insert(kid, sealed)?;
        Ok(())
    }

    /// Fetch a sealed private key.
    pub fn get_private_key(&self, kid: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.private_keys.get(kid)?.map(|v| v.to_vec()))
    }

    /// Drop a sealed private key. Returns whether one was stored.
    pub fn remove_private_key(&self, kid: &str) -> StoreResult<bool> {
        Ok(self.private_keys.remove(kid)?.is_some())
    }

    /// Number of sealed private keys.
    pub fn private_key_count(&self) -> usize {
        self.private_keys.len()
    }
}

#[async_trait]
impl IdentifierStore for DidStore {
    async fn save(&self, identifier: &Identifier) -> StoreResult<()> {
        self.insert_identifier(identifier)
    }

    async fn update(&self, identifier: &Identifier) -> StoreResult<()> {
        self.replace_identifier(identifier)
    }

    async fn find_by_did(&self, did: &str) -> StoreResult<Option<Identifier>> {
        self.get_identifier(did)
    }

    async fn find_by_alias(&self, alias: &str) -> StoreResult<Option<Identifier>> {
        self.get_identifier_by_alias(alias)
    }

    async fn list(&self) -> StoreResult<Vec<Identifier>> {
        self.all_identifiers()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
