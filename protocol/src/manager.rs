//! # DID Manager
//!
//! The entry point applications use. Ties the construction engine, the
//! identifier store and the resolver registry together:
//!
//! ```text
//! create_*_did ──▶ ValyuDidProvider::create_identifier
//!                      │
//!                      ▼
//!                  IdentifierStore::save   (DID / alias uniqueness)
//!                      │
//!                      ▼
//!                  Resolver::resolve       (document returned to caller)
//! ```

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{AES_KEY_LENGTH, DEFAULT_KMS};
use crate::identity::{
    CreateOptions, DidDocument, DidError, DidResolver, Identifier, Key, ResolutionResult, Resolver,
    Service, ValyuDidProvider,
};
use crate::kms::{KeyManager, KmsError, LocalKeyManagementSystem};
use crate::storage::{DidStore, IdentifierStore};

/// Creates, looks up and resolves did:valyu identifiers.
#[derive(Clone)]
pub struct DidManager {
    provider: ValyuDidProvider,
    store: Arc<dyn IdentifierStore>,
    resolver: Resolver,
}

impl DidManager {
    pub fn new(
        provider: ValyuDidProvider,
        store: Arc<dyn IdentifierStore>,
        resolver: Resolver,
    ) -> Self {
        Self {
            provider,
            store,
            resolver,
        }
    }

    /// Wire a manager over a sled store with the local KMS.
    pub fn local(store: DidStore, kms_secret: &[u8; AES_KEY_LENGTH]) -> Self {
        let local = LocalKeyManagementSystem::new(store.clone(), kms_secret);
        Self::with_local_kms(store, local)
    }

    /// Like [`local`](Self::local), with the KMS secret given as hex.
    pub fn local_from_secret_hex(store: DidStore, secret_hex: &str) -> Result<Self, KmsError> {
        let local = LocalKeyManagementSystem::from_secret_hex(store.clone(), secret_hex)?;
        Ok(Self::with_local_kms(store, local))
    }

    fn with_local_kms(store: DidStore, local: LocalKeyManagementSystem) -> Self {
        let keys = KeyManager::new().with_backend(DEFAULT_KMS, Arc::new(local));
        let store: Arc<dyn IdentifierStore> = Arc::new(store);
        let provider = ValyuDidProvider::new(Arc::new(keys), store.clone());
        let resolver = Resolver::valyu(store.clone());
        Self::new(provider, store, resolver)
    }

    /// Construct and persist a new identifier.
    ///
    /// A taken alias is rejected before any key is generated. The store's
    /// insert stays the authoritative uniqueness check; when it fails, the
    /// freshly generated keys are discarded again.
    pub async fn create(
        &self,
        alias: Option<&str>,
        options: CreateOptions,
        kms: Option<&str>,
    ) -> Result<Identifier, DidError> {
        if alias.is_some_and(str::is_empty) {
            return Err(DidError::InvalidOptions("alias must not be empty".to_string()));
        }

        if let Some(alias) = alias {
            if self.store.find_by_alias(alias).await?.is_some() {
                return Err(DidError::DuplicateAlias(alias.to_string()));
            }
        }

        let mut identifier = self.provider.create_identifier(options, kms).await?;
        identifier.alias = alias.map(str::to_string);
        if let Err(e) = self.store.save(&identifier).await {
            debug!(did = %identifier.did, error = %e, "save failed, discarding keys");
            self.provider.discard_keys(&identifier.keys).await;
            return Err(e.into());
        }

        info!(did = %identifier.did, alias = ?identifier.alias, "identifier created");
        Ok(identifier)
    }

    /// Create an identifier and return its document as resolution sees it.
    pub async fn create_and_resolve(
        &self,
        alias: Option<&str>,
        options: CreateOptions,
        kms: Option<&str>,
    ) -> Result<DidDocument, DidError> {
        let identifier = self.create(alias, options, kms).await?;
        self.document_for(&identifier.did).await
    }

    /// Create a user identifier and return its resolved document.
    pub async fn create_user_did(&self, alias: &str) -> Result<DidDocument, DidError> {
        self.create_and_resolve(Some(alias), CreateOptions::User, None).await
    }

    /// Create a data identifier and return its resolved document.
    pub async fn create_data_did(
        &self,
        alias: &str,
        data_token_address: &str,
        chain_id: &str,
        access_endpoint: &str,
    ) -> Result<DidDocument, DidError> {
        let options = CreateOptions::Data {
            data_token_address: data_token_address.to_string(),
            chain_id: chain_id.to_string(),
            access_endpoint: access_endpoint.to_string(),
        };
        self.create_and_resolve(Some(alias), options, None).await
    }

    async fn document_for(&self, did: &str) -> Result<DidDocument, DidError> {
        let result = self.resolve_did(did).await;
        match result.did_document {
            Some(document) => Ok(document),
            None => {
                error!(
                    did,
                    error = ?result.did_resolution_metadata.error,
                    "freshly created DID did not resolve"
                );
                Err(DidError::NotFound(did.to_string()))
            }
        }
    }

    /// Resolve any DID through the method registry.
    pub async fn resolve_did(&self, did: &str) -> ResolutionResult {
        self.resolver.resolve(did).await
    }

    pub async fn get(&self, did: &str) -> Result<Identifier, DidError> {
        self.store
            .find_by_did(did)
            .await?
            .ok_or_else(|| DidError::NotFound(did.to_string()))
    }

    pub async fn get_by_alias(&self, alias: &str) -> Result<Identifier, DidError> {
        self.store
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| DidError::NotFound(alias.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Identifier>, DidError> {
        Ok(self.store.list().await?)
    }

    pub async fn add_key(&self, did: &str, key: Key) -> Result<Identifier, DidError> {
        self.provider.add_key(did, key).await
    }

    pub async fn add_service(&self, did: &str, service: Service) -> Result<Identifier, DidError> {
        self.provider.add_service(did, service).await
    }

    pub async fn delete(&self, did: &str) -> Result<bool, DidError> {
        self.provider.delete_identifier(did).await
    }
}
