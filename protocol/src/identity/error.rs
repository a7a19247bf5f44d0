//! Error type for identifier creation and management.
//!
//! Everything on the creation path returns a [`DidError`]. Resolution does
//! not: its failures are folded into
//! [`ResolutionResult`](super::resolver::ResolutionResult) instead.

use thiserror::Error;

use super::address::AddressError;
use crate::kms::KmsError;
use crate::storage::StoreError;

/// Errors surfaced by the construction engine and the DID manager.
#[derive(Debug, Error)]
pub enum DidError {
    /// Creation options were missing a field or had an unknown shape.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The key management backend could not produce a key.
    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] KmsError),

    /// An identifier with this DID already exists.
    #[error("identifier already exists: {0}")]
    DuplicateDid(String),

    /// Another identifier already uses this alias.
    #[error("alias already in use: {0}")]
    DuplicateAlias(String),

    /// No identifier matched the lookup.
    #[error("identifier not found: {0}")]
    NotFound(String),

    /// The lifecycle operation is not supported by did:valyu.
    #[error("not_implemented: {0}")]
    NotImplemented(&'static str),

    /// The primary key's public key could not be turned into an address.
    #[error("address derivation failed: {0}")]
    Address(#[from] AddressError),

    /// The identifier store failed.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for DidError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateDid(did) => DidError::DuplicateDid(did),
            StoreError::DuplicateAlias(alias) => DidError::DuplicateAlias(alias),
            StoreError::NotFound(did) => DidError::NotFound(did),
            other => DidError::Storage(other),
        }
    }
}
