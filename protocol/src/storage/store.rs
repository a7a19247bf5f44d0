//! The identifier store seam.
//!
//! Construction, resolution and the DID manager only ever see this trait.
//! [`DidStore`](super::DidStore) is the in-repo implementation.

use async_trait::async_trait;

use super::db::StoreResult;
use crate::identity::Identifier;

/// Durable, DID-keyed identifier storage with a unique alias index.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Insert a new record. Fails with `DuplicateDid` or `DuplicateAlias`
    /// rather than overwriting.
    async fn save(&self, identifier: &Identifier) -> StoreResult<()>;

    /// Replace an existing record. Fails with `NotFound` if absent.
    async fn update(&self, identifier: &Identifier) -> StoreResult<()>;

    /// Load a record with its keys and services, in stored order.
    async fn find_by_did(&self, did: &str) -> StoreResult<Option<Identifier>>;

    async fn find_by_alias(&self, alias: &str) -> StoreResult<Option<Identifier>>;

    async fn list(&self) -> StoreResult<Vec<Identifier>>;
}
