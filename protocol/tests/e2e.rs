//! End-to-end integration tests for did:valyu.
//!
//! These exercise the full path from creation options through key
//! generation, persistence, and resolution, using only the public API.
//! Each test gets its own temporary store.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use valyu_did::crypto::KeyType;
use valyu_did::identity::{
    derive_ethereum_address, CreateOptions, DidDocument, DidError, DidVariant, Key,
    ResolutionErrorKind, Service,
};
use valyu_did::kms::LocalKeyManagementSystem;
use valyu_did::manager::DidManager;
use valyu_did::storage::DidStore;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const KMS_SECRET: [u8; 32] = [0x11; 32];

fn setup() -> (DidManager, DidStore) {
    let store = DidStore::open_temporary().expect("temp store");
    (DidManager::local(store.clone(), &KMS_SECRET), store)
}

// ---------------------------------------------------------------------------
// User identifiers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_user_did_lifecycle() {
    let (manager, _) = setup();
    let identifier = manager
        .create(Some("alice"), CreateOptions::User, None)
        .await
        .unwrap();

    // DID is derived from the primary key's address.
    let address = derive_ethereum_address(&identifier.keys[0].public_key_hex).unwrap();
    assert_eq!(identifier.did, format!("did:valyu:user:{address}"));
    assert_eq!(address.len(), 42);

    let result = manager.resolve_did(&identifier.did).await;
    let Some(DidDocument::User(doc)) = result.did_document else {
        panic!("expected a user document");
    };
    assert_eq!(doc.id, identifier.did);
    assert_eq!(doc.controller, identifier.controller_key_id);
    assert_eq!(
        doc.verification_method[0].public_key_hex,
        identifier.keys[0].public_key_hex
    );
    assert_eq!(doc.key_agreement[0].public_key_hex, identifier.keys[1].public_key_hex);
    assert_eq!(doc.authentication, vec![format!("{}#ethereum-key-1", identifier.did)]);
}

#[tokio::test]
async fn test_user_dids_are_unique() {
    let (manager, _) = setup();
    let a = manager.create(None, CreateOptions::User, None).await.unwrap();
    let b = manager.create(None, CreateOptions::User, None).await.unwrap();
    assert_ne!(a.did, b.did);
}

// ---------------------------------------------------------------------------
// Data identifiers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_data_did_from_json_options() {
    let (manager, _) = setup();
    let options = CreateOptions::from_value(&json!({
        "dataTokenAddress": "0xABCD",
        "chainId": "1",
        "accessEndpoint": "https://x.io"
    }))
    .unwrap();

    let identifier = manager.create(Some("ds"), options, None).await.unwrap();
    assert_eq!(identifier.did, "did:valyu:data:10xABCD");

    let json = serde_json::to_value(manager.resolve_did(&identifier.did).await).unwrap();
    let doc = &json["didDocument"];
    assert_eq!(doc["@context"], "https://www.w3.org/ns/did/v1");
    assert_eq!(doc["id"], "did:valyu:data:10xABCD");
    assert_eq!(doc["verificationMethod"][0]["id"], "did:valyu:data:10xABCD#key-1");
    assert_eq!(doc["verificationMethod"][0]["type"], "Secp256k1");
    assert_eq!(doc["assertionMethod"][0], "did:valyu:data:10xABCD#key-1");
    assert_eq!(doc["keyAgreement"][0]["id"], "did:valyu:data:10xABCD#key-exchange-1");
    assert_eq!(doc["keyAgreement"][0]["type"], "X25519");
    assert_eq!(doc["service"][0]["id"], "did:valyu:data:10xABCD#access");
    assert_eq!(doc["service"][0]["type"], "Access");
    assert_eq!(doc["service"][0]["serviceEndpoint"], "https://x.io");
    assert_eq!(
        json["didResolutionMetadata"]["contentType"],
        "application/did+ld+json"
    );
}

#[tokio::test]
async fn test_colliding_data_suffix_is_rejected() {
    let (manager, _) = setup();
    manager
        .create_data_did("first", "0xAB", "1", "https://a.io")
        .await
        .unwrap();
    let err = manager
        .create_data_did("second", "xAB", "10", "https://b.io")
        .await
        .unwrap_err();
    assert!(matches!(err, DidError::DuplicateDid(ref did) if did == "did:valyu:data:10xAB"));
}

#[tokio::test]
async fn test_concurrent_duplicate_creation() {
    let (manager, store) = setup();
    let attempts = (0..6).map(|i| {
        let manager = manager.clone();
        async move {
            manager
                .create_data_did(&format!("alias-{i}"), "0xFEED", "137", "https://x.io")
                .await
        }
    });

    let results = join_all(attempts).await;
    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(DidError::DuplicateDid(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 5);

    // Only the winner's keys stay sealed in the store.
    assert_eq!(store.private_key_count(), 2);
}

// ---------------------------------------------------------------------------
// Resolution edge cases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_resolution_never_errors() {
    let (manager, _) = setup();
    let cases = [
        ("did:valyu:thing:1", ResolutionErrorKind::UnknownDidType),
        ("did:valyu:user:0x0000000000000000000000000000000000000000", ResolutionErrorKind::NotFound),
        ("did:valyu:data:1missing", ResolutionErrorKind::NotFound),
        ("did:ethr:0x1", ResolutionErrorKind::UnsupportedDidMethod),
        ("not a did", ResolutionErrorKind::InvalidDid),
    ];
    for (did, expected) in cases {
        let result = manager.resolve_did(did).await;
        assert_eq!(result.error(), Some(expected), "{did}");
        assert!(result.did_document.is_none());
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let (manager, _) = setup();
    let document = manager.create_user_did("alice").await.unwrap();
    let first = manager.resolve_did(document.id()).await;
    let second = manager.resolve_did(document.id()).await;
    assert_eq!(first, second);
    assert_eq!(first.did_document.unwrap(), document);
}

// ---------------------------------------------------------------------------
// Extension hooks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_add_key_and_service() {
    let (manager, store) = setup();
    let document = manager
        .create_data_did("ds", "0x01", "5", "https://x.io")
        .await
        .unwrap();

    let kms = LocalKeyManagementSystem::new(store, &KMS_SECRET);
    let extra = {
        use valyu_did::kms::KeyManagementSystem;
        kms.create_key(KeyType::SigningSecp256k1).await.unwrap()
    };
    let updated = manager.add_key(document.id(), extra.clone()).await.unwrap();
    assert_eq!(updated.keys.len(), 3);
    assert_eq!(updated.keys[2], extra);

    let service = Service {
        id: "mirror".to_string(),
        service_type: "Access".to_string(),
        service_endpoint: "https://mirror.io".to_string(),
    };
    manager.add_service(document.id(), service).await.unwrap();

    // The document projection is unchanged by extra keys and services.
    let after = manager.resolve_did(document.id()).await.did_document.unwrap();
    assert_eq!(after, document);
}

#[tokio::test]
async fn test_add_key_to_unknown_did() {
    let (manager, _) = setup();
    let key = Key {
        kid: "k".to_string(),
        kms: "local".to_string(),
        key_type: KeyType::KeyAgreementX25519,
        public_key_hex: "00".repeat(32),
        meta: None,
    };
    let err = manager.add_key("did:valyu:user:0x0", key).await.unwrap_err();
    assert!(matches!(err, DidError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_identifiers_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let did = {
        let store = DidStore::open(dir.path()).unwrap();
        let manager = DidManager::local(store.clone(), &KMS_SECRET);
        let document = manager.create_user_did("alice").await.unwrap();
        store.flush().unwrap();
        document.id().to_string()
    };

    let store = DidStore::open(dir.path()).unwrap();
    let manager = DidManager::local(store.clone(), &KMS_SECRET);
    let result = manager.resolve_did(&did).await;
    assert_eq!(result.did_document.unwrap().variant(), DidVariant::User);

    // The sealed primary key opens with the same secret after reopen.
    let identifier = manager.get_by_alias("alice").await.unwrap();
    let kms = LocalKeyManagementSystem::new(store, &KMS_SECRET);
    let primary = &identifier.keys[0];
    let material = kms.load_key_material(&primary.kid, primary.key_type).unwrap();
    assert_eq!(material.public_key_hex(), primary.public_key_hex);
}

#[tokio::test]
async fn test_shared_store_between_managers() {
    let store = DidStore::open_temporary().unwrap();
    let writer = Arc::new(DidManager::local(store.clone(), &KMS_SECRET));
    let reader = DidManager::local(store, &KMS_SECRET);

    let document = writer.create_user_did("bob").await.unwrap();
    assert!(reader.resolve_did(document.id()).await.is_success());
}
