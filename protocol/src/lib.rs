// Copyright (c) 2026 Valyu Engineering. MIT License.
// See LICENSE for details.

//! # did:valyu Core Library
//!
//! Minting, storing and resolving `did:valyu` identifiers. Two kinds exist:
//!
//! - **user**: `did:valyu:user:<ethereum address>`, where the address is
//!   derived from the identifier's secp256k1 primary key.
//! - **data**: `did:valyu:data:<chainId><dataTokenAddress>`, bound to a data
//!   token on a chain and carrying an access service endpoint.
//!
//! Every identifier holds a secp256k1 primary key and an X25519
//! key-agreement key, and is rendered on demand as a W3C DID Document.
//!
//! ## Architecture
//!
//! - **config**: Method constants: prefixes, fragments, sizes.
//! - **crypto**: Key generation, Keccak-256, key sealing.
//! - **kms**: Key management backends; private keys stay inside them.
//! - **storage**: The identifier store trait and its sled implementation.
//! - **identity**: DID formats, documents, construction and resolution.
//! - **manager**: `DidManager`, the create / get / resolve entry point.
//!
//! ## Example
//!
//! ```
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use valyu_did::{manager::DidManager, storage::DidStore};
//!
//! let store = DidStore::open_temporary().unwrap();
//! let manager = DidManager::local(store, &[7u8; 32]);
//!
//! let document = manager.create_user_did("alice").await.unwrap();
//! let result = manager.resolve_did(document.id()).await;
//! assert_eq!(result.did_document.unwrap().id(), document.id());
//! # });
//! ```

pub mod config;
pub mod crypto;
pub mod identity;
pub mod kms;
pub mod manager;
pub mod storage;
