//! # Identifier Construction Engine
//!
//! `ValyuDidProvider` mints identifier records from creation options. It
//! requests key material, derives the DID, and returns the record; it does
//! not persist it. Saving (and the uniqueness check that comes with it) is
//! the caller's job, see [`crate::manager::DidManager`].
//!
//! ## Key order
//!
//! Both variants store `keys = [primary, agreement]`. The user variant
//! requests the agreement key from the backend first, then the primary key;
//! the data variant requests them in stored order. Only the stored order is
//! observable.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::address::derive_ethereum_address;
use super::did::{data_did, user_did};
use super::error::DidError;
use super::types::{Identifier, Key, Service};
use crate::config::{DATA_SERVICE_ID, DATA_SERVICE_TYPE, DEFAULT_KMS, DID_PROVIDER, USER_DID_TYPE};
use crate::crypto::KeyType;
use crate::kms::KeyMaterialProvider;
use crate::storage::IdentifierStore;

// ---------------------------------------------------------------------------
// Creation Options
// ---------------------------------------------------------------------------

/// What kind of identifier to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOptions {
    User,
    Data {
        data_token_address: String,
        chain_id: String,
        access_endpoint: String,
    },
}

impl CreateOptions {
    /// Interpret untyped JSON options.
    ///
    /// A `dataTokenAddress` field selects the data variant, which then also
    /// needs `chainId` and `accessEndpoint`. Otherwise `didType` must be
    /// `"user"`. `chainId` may be a JSON string or number.
    pub fn from_value(value: &Value) -> Result<Self, DidError> {
        if let Some(token) = value.get("dataTokenAddress") {
            let data_token_address = string_field("dataTokenAddress", Some(token))?;
            let chain_id = string_field("chainId", value.get("chainId"))?;
            let access_endpoint = string_field("accessEndpoint", value.get("accessEndpoint"))?;
            return Ok(CreateOptions::Data {
                data_token_address,
                chain_id,
                access_endpoint,
            });
        }

        match value.get("didType").and_then(Value::as_str) {
            Some(USER_DID_TYPE) => Ok(CreateOptions::User),
            Some(other) => Err(DidError::InvalidOptions(format!("unknown didType: {other}"))),
            None => Err(DidError::InvalidOptions(
                "expected dataTokenAddress or didType".to_string(),
            )),
        }
    }
}

fn string_field(name: &str, value: Option<&Value>) -> Result<String, DidError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(DidError::InvalidOptions(format!("{name} must be a string"))),
        None => Err(DidError::InvalidOptions(format!("{name} is required"))),
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<(), DidError> {
    if value.is_empty() {
        return Err(DidError::InvalidOptions(format!("{name} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// The did:valyu identifier provider.
#[derive(Clone)]
pub struct ValyuDidProvider {
    keys: Arc<dyn KeyMaterialProvider>,
    store: Arc<dyn IdentifierStore>,
    default_kms: String,
}

impl ValyuDidProvider {
    pub fn new(keys: Arc<dyn KeyMaterialProvider>, store: Arc<dyn IdentifierStore>) -> Self {
        Self {
            keys,
            store,
            default_kms: DEFAULT_KMS.to_string(),
        }
    }

    /// Use `kms` when callers don't name a backend.
    pub fn with_default_kms(mut self, kms: impl Into<String>) -> Self {
        self.default_kms = kms.into();
        self
    }

    pub fn default_kms(&self) -> &str {
        &self.default_kms
    }

    /// Build a new, unsaved identifier record.
    ///
    /// Key generation failures are returned as they happen; nothing is
    /// retried. The returned record has no alias.
    pub async fn create_identifier(
        &self,
        options: CreateOptions,
        kms: Option<&str>,
    ) -> Result<Identifier, DidError> {
        let kms = kms.unwrap_or(self.default_kms.as_str());

        match options {
            CreateOptions::User => self.create_user(kms).await,
            CreateOptions::Data {
                data_token_address,
                chain_id,
                access_endpoint,
            } => {
                require_non_empty("dataTokenAddress", &data_token_address)?;
                require_non_empty("chainId", &chain_id)?;
                require_non_empty("accessEndpoint", &access_endpoint)?;
                self.create_data(kms, &data_token_address, &chain_id, access_endpoint)
                    .await
            }
        }
    }

    async fn create_user(&self, kms: &str) -> Result<Identifier, DidError> {
        let agreement = self.keys.generate_key(KeyType::KeyAgreementX25519, kms).await?;
        let primary = match self.keys.generate_key(KeyType::SigningSecp256k1, kms).await {
            Ok(key) => key,
            Err(e) => {
                self.discard_keys(&[agreement]).await;
                return Err(e.into());
            }
        };
        debug!(kms, primary = %primary.kid, "user keys generated");

        let address = match derive_ethereum_address(&primary.public_key_hex) {
            Ok(address) => address,
            Err(e) => {
                self.discard_keys(&[primary, agreement]).await;
                return Err(e.into());
            }
        };
        let did = user_did(&address);
        info!(%did, "user identifier constructed");

        Ok(Identifier {
            did,
            alias: None,
            provider: DID_PROVIDER.to_string(),
            controller_key_id: primary.kid.clone(),
            keys: vec![primary, agreement],
            services: Vec::new(),
            created_at: Utc::now(),
        })
    }

    async fn create_data(
        &self,
        kms: &str,
        data_token_address: &str,
        chain_id: &str,
        access_endpoint: String,
    ) -> Result<Identifier, DidError> {
        let primary = self.keys.generate_key(KeyType::SigningSecp256k1, kms).await?;
        let agreement = match self.keys.generate_key(KeyType::KeyAgreementX25519, kms).await {
            Ok(key) => key,
            Err(e) => {
                self.discard_keys(&[primary]).await;
                return Err(e.into());
            }
        };
        debug!(kms, primary = %primary.kid, "data keys generated");

        let did = data_did(chain_id, data_token_address);
        info!(%did, chain_id, "data identifier constructed");

        Ok(Identifier {
            did,
            alias: None,
            provider: DID_PROVIDER.to_string(),
            controller_key_id: primary.kid.clone(),
            keys: vec![primary, agreement],
            services: vec![Service {
                id: DATA_SERVICE_ID.to_string(),
                service_type: DATA_SERVICE_TYPE.to_string(),
                service_endpoint: access_endpoint,
            }],
            created_at: Utc::now(),
        })
    }

    /// Release key material generated for an identifier that was never
    /// saved. Failures are logged, not returned: the caller is already
    /// reporting the error that got it here.
    pub async fn discard_keys(&self, keys: &[Key]) {
        for key in keys {
            if let Err(e) = self.keys.discard_key(key).await {
                warn!(kid = %key.kid, kms = %key.kms, error = %e, "failed to discard key");
            }
        }
    }

    async fn load(&self, did: &str) -> Result<Identifier, DidError> {
        self.store
            .find_by_did(did)
            .await?
            .ok_or_else(|| DidError::NotFound(did.to_string()))
    }

    /// Append `key` to a stored identifier.
    ///
    /// Read-modify-write; concurrent appends to the same identifier can
    /// lose one of the writes.
    pub async fn add_key(&self, did: &str, key: Key) -> Result<Identifier, DidError> {
        let mut identifier = self.load(did).await?;
        debug!(did, kid = %key.kid, "appending key");
        identifier.keys.push(key);
        self.store.update(&identifier).await?;
        Ok(identifier)
    }

    /// Append `service` to a stored identifier. Same caveats as
    /// [`add_key`](Self::add_key).
    pub async fn add_service(&self, did: &str, service: Service) -> Result<Identifier, DidError> {
        let mut identifier = self.load(did).await?;
        debug!(did, service = %service.id, "appending service");
        identifier.services.push(service);
        self.store.update(&identifier).await?;
        Ok(identifier)
    }

    pub async fn delete_identifier(&self, _did: &str) -> Result<bool, DidError> {
        Err(DidError::NotImplemented("deleteIdentifier"))
    }

    pub async fn remove_key(&self, _did: &str, _kid: &str) -> Result<(), DidError> {
        Err(DidError::NotImplemented("removeKey"))
    }

    pub async fn remove_service(&self, _did: &str, _service_id: &str) -> Result<(), DidError> {
        Err(DidError::NotImplemented("removeService"))
    }

    pub async fn update_identifier(&self, _identifier: &Identifier) -> Result<(), DidError> {
        Err(DidError::NotImplemented("updateIdentifier"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::did::DidVariant;
    use crate::kms::{KeyManager, KmsError, LocalKeyManagementSystem};
    use crate::storage::DidStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn provider() -> (ValyuDidProvider, DidStore) {
        let store = DidStore::open_temporary().unwrap();
        let local = LocalKeyManagementSystem::new(store.clone(), &[3u8; 32]);
        let keys = KeyManager::new().with_backend("local", Arc::new(local));
        (
            ValyuDidProvider::new(Arc::new(keys), Arc::new(store.clone())),
            store,
        )
    }

    fn data_options() -> CreateOptions {
        CreateOptions::Data {
            data_token_address: "0xABCD".to_string(),
            chain_id: "1".to_string(),
            access_endpoint: "https://x.io".to_string(),
        }
    }

    /// Records the order of key requests and hands out fixed keys.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<KeyType>>,
        discarded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KeyMaterialProvider for RecordingProvider {
        async fn generate_key(&self, key_type: KeyType, kms: &str) -> Result<Key, KmsError> {
            self.calls.lock().unwrap().push(key_type);
            let public_key_hex = match key_type {
                KeyType::SigningSecp256k1 => "04".to_string() + &"11".repeat(64),
                KeyType::KeyAgreementX25519 => "22".repeat(32),
            };
            Ok(Key {
                kid: format!("kid-{key_type}"),
                kms: kms.to_string(),
                key_type,
                public_key_hex,
                meta: None,
            })
        }

        async fn discard_key(&self, key: &Key) -> Result<(), KmsError> {
            self.discarded.lock().unwrap().push(key.kid.clone());
            Ok(())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl KeyMaterialProvider for FailingProvider {
        async fn generate_key(&self, _key_type: KeyType, kms: &str) -> Result<Key, KmsError> {
            Err(KmsError::UnknownBackend(kms.to_string()))
        }

        async fn discard_key(&self, _key: &Key) -> Result<(), KmsError> {
            Ok(())
        }
    }

    /// Hands out the first key, then fails. Discards go to the inner provider.
    struct FailsOnSecondKey {
        inner: RecordingProvider,
    }

    #[async_trait]
    impl KeyMaterialProvider for FailsOnSecondKey {
        async fn generate_key(&self, key_type: KeyType, kms: &str) -> Result<Key, KmsError> {
            if !self.inner.calls.lock().unwrap().is_empty() {
                return Err(KmsError::UnknownKid("second".to_string()));
            }
            self.inner.generate_key(key_type, kms).await
        }

        async fn discard_key(&self, key: &Key) -> Result<(), KmsError> {
            self.inner.discard_key(key).await
        }
    }

    #[tokio::test]
    async fn user_identifier_structure() {
        let (provider, _) = provider();
        let identifier = provider.create_identifier(CreateOptions::User, None).await.unwrap();

        assert_eq!(DidVariant::classify(&identifier.did), Some(DidVariant::User));
        assert_eq!(identifier.provider, "did:valyu");
        assert_eq!(identifier.keys.len(), 2);
        assert_eq!(identifier.keys[0].key_type, KeyType::SigningSecp256k1);
        assert_eq!(identifier.keys[1].key_type, KeyType::KeyAgreementX25519);
        assert_eq!(identifier.controller_key_id, identifier.keys[0].kid);
        assert!(identifier.services.is_empty());

        let address = derive_ethereum_address(&identifier.keys[0].public_key_hex).unwrap();
        assert_eq!(identifier.did, format!("did:valyu:user:{address}"));
    }

    #[tokio::test]
    async fn data_identifier_structure() {
        let (provider, _) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();

        assert_eq!(identifier.did, "did:valyu:data:10xABCD");
        assert_eq!(identifier.keys.len(), 2);
        assert_eq!(identifier.keys[0].key_type, KeyType::SigningSecp256k1);
        assert_eq!(identifier.keys[1].key_type, KeyType::KeyAgreementX25519);
        assert_eq!(identifier.services.len(), 1);
        assert_eq!(identifier.services[0].id, "valyu");
        assert_eq!(identifier.services[0].service_type, "Access");
        assert_eq!(identifier.services[0].service_endpoint, "https://x.io");
    }

    #[tokio::test]
    async fn user_requests_agreement_key_first() {
        let recorder = Arc::new(RecordingProvider::default());
        let store = Arc::new(DidStore::open_temporary().unwrap());
        let provider = ValyuDidProvider::new(recorder.clone(), store);

        let identifier = provider.create_identifier(CreateOptions::User, None).await.unwrap();

        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![KeyType::KeyAgreementX25519, KeyType::SigningSecp256k1]
        );
        assert_eq!(identifier.keys[0].kid, "kid-Secp256k1");
        assert_eq!(identifier.keys[1].kid, "kid-X25519");
    }

    #[tokio::test]
    async fn kms_override_and_default() {
        let recorder = Arc::new(RecordingProvider::default());
        let store = Arc::new(DidStore::open_temporary().unwrap());
        let provider = ValyuDidProvider::new(recorder, store).with_default_kms("vault");

        let identifier = provider.create_identifier(data_options(), None).await.unwrap();
        assert!(identifier.keys.iter().all(|k| k.kms == "vault"));

        let identifier = provider
            .create_identifier(data_options(), Some("hsm"))
            .await
            .unwrap();
        assert!(identifier.keys.iter().all(|k| k.kms == "hsm"));
    }

    #[tokio::test]
    async fn key_generation_failure_propagates() {
        let store = Arc::new(DidStore::open_temporary().unwrap());
        let provider = ValyuDidProvider::new(Arc::new(FailingProvider), store);

        let err = provider.create_identifier(CreateOptions::User, None).await.unwrap_err();
        assert!(matches!(err, DidError::KeyGeneration(_)));
    }

    #[tokio::test]
    async fn partial_key_generation_is_discarded() {
        for (options, first) in [
            (CreateOptions::User, "kid-X25519"),
            (data_options(), "kid-Secp256k1"),
        ] {
            let keys = Arc::new(FailsOnSecondKey {
                inner: RecordingProvider::default(),
            });
            let store = Arc::new(DidStore::open_temporary().unwrap());
            let provider = ValyuDidProvider::new(keys.clone(), store);

            let err = provider.create_identifier(options, None).await.unwrap_err();
            assert!(matches!(err, DidError::KeyGeneration(KmsError::UnknownKid(_))));
            assert_eq!(*keys.inner.discarded.lock().unwrap(), vec![first.to_string()]);
        }
    }

    #[tokio::test]
    async fn discard_keys_removes_sealed_secrets() {
        let (provider, store) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();
        assert_eq!(store.private_key_count(), 2);

        provider.discard_keys(&identifier.keys).await;
        assert_eq!(store.private_key_count(), 0);
    }

    #[tokio::test]
    async fn unknown_kms_is_key_generation_error() {
        let (provider, _) = provider();
        let err = provider
            .create_identifier(CreateOptions::User, Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, DidError::KeyGeneration(KmsError::UnknownBackend(_))));
    }

    #[tokio::test]
    async fn empty_data_fields_rejected() {
        let (provider, _) = provider();
        for (token, chain, endpoint) in [("", "1", "e"), ("0x1", "", "e"), ("0x1", "1", "")] {
            let options = CreateOptions::Data {
                data_token_address: token.to_string(),
                chain_id: chain.to_string(),
                access_endpoint: endpoint.to_string(),
            };
            let err = provider.create_identifier(options, None).await.unwrap_err();
            assert!(matches!(err, DidError::InvalidOptions(_)));
        }
    }

    #[tokio::test]
    async fn create_does_not_persist() {
        let (provider, store) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();
        assert!(store.get_identifier(&identifier.did).unwrap().is_none());
    }

    #[tokio::test]
    async fn add_key_appends_supplied_key() {
        let (provider, store) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();
        store.insert_identifier(&identifier).unwrap();

        let extra = Key {
            kid: "extra".to_string(),
            kms: "local".to_string(),
            key_type: KeyType::SigningSecp256k1,
            public_key_hex: "04ff".to_string(),
            meta: None,
        };
        provider.add_key(&identifier.did, extra.clone()).await.unwrap();

        let stored = store.get_identifier(&identifier.did).unwrap().unwrap();
        assert_eq!(stored.keys.len(), 3);
        assert_eq!(stored.keys[2], extra);
        assert_eq!(stored.keys[..2], identifier.keys[..]);
    }

    #[tokio::test]
    async fn add_service_appends() {
        let (provider, store) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();
        store.insert_identifier(&identifier).unwrap();

        let service = Service {
            id: "mirror".to_string(),
            service_type: "Access".to_string(),
            service_endpoint: "https://mirror.io".to_string(),
        };
        let updated = provider
            .add_service(&identifier.did, service.clone())
            .await
            .unwrap();
        assert_eq!(updated.services.last(), Some(&service));
        assert_eq!(store.get_identifier(&identifier.did).unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn add_to_missing_identifier() {
        let (provider, _) = provider();
        let service = Service {
            id: "s".to_string(),
            service_type: "Access".to_string(),
            service_endpoint: "e".to_string(),
        };
        let err = provider
            .add_service("did:valyu:data:0x", service)
            .await
            .unwrap_err();
        assert!(matches!(err, DidError::NotFound(_)));
    }

    #[tokio::test]
    async fn unsupported_lifecycle_operations() {
        let (provider, _) = provider();
        let identifier = provider.create_identifier(data_options(), None).await.unwrap();

        assert!(matches!(
            provider.delete_identifier(&identifier.did).await,
            Err(DidError::NotImplemented("deleteIdentifier"))
        ));
        assert!(matches!(
            provider.remove_key(&identifier.did, "k").await,
            Err(DidError::NotImplemented("removeKey"))
        ));
        assert!(matches!(
            provider.remove_service(&identifier.did, "s").await,
            Err(DidError::NotImplemented("removeService"))
        ));
        assert!(matches!(
            provider.update_identifier(&identifier).await,
            Err(DidError::NotImplemented("updateIdentifier"))
        ));
    }

    #[test]
    fn options_from_json() {
        assert_eq!(
            CreateOptions::from_value(&json!({ "didType": "user" })).unwrap(),
            CreateOptions::User
        );
        assert_eq!(
            CreateOptions::from_value(&json!({
                "dataTokenAddress": "0xABCD",
                "chainId": 1,
                "accessEndpoint": "https://x.io"
            }))
            .unwrap(),
            data_options()
        );
    }

    #[test]
    fn data_token_address_wins_over_did_type() {
        let options = CreateOptions::from_value(&json!({
            "didType": "user",
            "dataTokenAddress": "0xABCD",
            "chainId": "1",
            "accessEndpoint": "https://x.io"
        }))
        .unwrap();
        assert_eq!(options, data_options());
    }

    #[test]
    fn options_from_json_rejects_bad_shapes() {
        for value in [
            json!({}),
            json!({ "didType": "admin" }),
            json!({ "dataTokenAddress": "0x1" }),
            json!({ "dataTokenAddress": "0x1", "chainId": "1", "accessEndpoint": true }),
        ] {
            assert!(matches!(
                CreateOptions::from_value(&value),
                Err(DidError::InvalidOptions(_))
            ));
        }
    }
}
