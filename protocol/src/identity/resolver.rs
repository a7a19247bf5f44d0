//! # DID Resolution
//!
//! Resolution never fails with an `Err`. Every outcome is a
//! [`ResolutionResult`]: a document on success, or `didDocument: null` with
//! an error code in the resolution metadata.
//!
//! | Outcome                              | `error`                |
//! |--------------------------------------|------------------------|
//! | DID has neither `:user:` nor `:data:` | `unknownDidType`       |
//! | No stored record                     | `notFound`             |
//! | Store failure or malformed record    | `notFound`             |
//! | Not `did:<method>:<id>` (registry)   | `invalidDid`           |
//! | Method not registered (registry)     | `unsupportedDidMethod` |
//!
//! Store failures and malformed records are reported as `notFound` so that
//! callers see a single "absent" outcome. The underlying cause is logged at
//! `error` level and never placed in the result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::did::DidVariant;
use super::document::DidDocument;
use crate::config::{DID_CONTENT_TYPE, DID_METHOD};
use crate::storage::IdentifierStore;

// ---------------------------------------------------------------------------
// Result Types
// ---------------------------------------------------------------------------

/// Error codes reported in `didResolutionMetadata.error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionErrorKind {
    UnknownDidType,
    NotFound,
    InvalidDid,
    UnsupportedDidMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// The outcome of resolving a DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub did_document: Option<DidDocument>,
    pub did_document_metadata: DocumentMetadata,
    pub did_resolution_metadata: ResolutionMetadata,
}

impl ResolutionResult {
    pub fn success(document: DidDocument, created: DateTime<Utc>) -> Self {
        Self {
            did_document: Some(document),
            did_document_metadata: DocumentMetadata {
                created: Some(created),
            },
            did_resolution_metadata: ResolutionMetadata {
                error: None,
                content_type: Some(DID_CONTENT_TYPE.to_string()),
            },
        }
    }

    pub fn failure(kind: ResolutionErrorKind) -> Self {
        Self {
            did_document: None,
            did_document_metadata: DocumentMetadata::default(),
            did_resolution_metadata: ResolutionMetadata {
                error: Some(kind),
                content_type: None,
            },
        }
    }

    pub fn error(&self) -> Option<ResolutionErrorKind> {
        self.did_resolution_metadata.error
    }

    pub fn is_success(&self) -> bool {
        self.did_document.is_some()
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// A resolver for one DID method.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> ResolutionResult;
}

/// Resolves did:valyu identifiers from an [`IdentifierStore`].
#[derive(Clone)]
pub struct ValyuDidResolver {
    store: Arc<dyn IdentifierStore>,
}

impl ValyuDidResolver {
    pub fn new(store: Arc<dyn IdentifierStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DidResolver for ValyuDidResolver {
    async fn resolve(&self, did: &str) -> ResolutionResult {
        let Some(variant) = DidVariant::classify(did) else {
            warn!(did, "unknown DID type");
            return ResolutionResult::failure(ResolutionErrorKind::UnknownDidType);
        };

        let identifier = match self.store.find_by_did(did).await {
            Ok(Some(identifier)) => identifier,
            Ok(None) => {
                warn!(did, "DID not found");
                return ResolutionResult::failure(ResolutionErrorKind::NotFound);
            }
            Err(e) => {
                error!(did, error = %e, "identifier store failed during resolution");
                return ResolutionResult::failure(ResolutionErrorKind::NotFound);
            }
        };

        match DidDocument::render(&identifier, variant) {
            Ok(document) => {
                info!(did, %variant, "DID resolved");
                ResolutionResult::success(document, identifier.created_at)
            }
            Err(e) => {
                error!(did, error = %e, "stored identifier is malformed");
                ResolutionResult::failure(ResolutionErrorKind::NotFound)
            }
        }
    }
}

/// Dispatches resolution by DID method.
#[derive(Default, Clone)]
pub struct Resolver {
    methods: HashMap<String, Arc<dyn DidResolver>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `valyu` wired to the given store.
    pub fn valyu(store: Arc<dyn IdentifierStore>) -> Self {
        Self::new().with_method(DID_METHOD, Arc::new(ValyuDidResolver::new(store)))
    }

    pub fn register(&mut self, method: impl Into<String>, resolver: Arc<dyn DidResolver>) {
        self.methods.insert(method.into(), resolver);
    }

    pub fn with_method(mut self, method: impl Into<String>, resolver: Arc<dyn DidResolver>) -> Self {
        self.register(method, resolver);
        self
    }

    /// Extract the method name from `did:<method>:<id>`.
    fn parse_method(did: &str) -> Option<&str> {
        let mut parts = did.splitn(3, ':');
        let scheme = parts.next()?;
        let method = parts.next()?;
        let id = parts.next()?;
        if scheme != "did" || method.is_empty() || id.is_empty() {
            return None;
        }
        Some(method)
    }
}

#[async_trait]
impl DidResolver for Resolver {
    async fn resolve(&self, did: &str) -> ResolutionResult {
        let Some(method) = Self::parse_method(did) else {
            warn!(did, "malformed DID");
            return ResolutionResult::failure(ResolutionErrorKind::InvalidDid);
        };
        match self.methods.get(method) {
            Some(resolver) => resolver.resolve(did).await,
            None => {
                warn!(did, method, "unsupported DID method");
                ResolutionResult::failure(ResolutionErrorKind::UnsupportedDidMethod)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
