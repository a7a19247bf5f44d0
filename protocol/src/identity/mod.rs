//! # Identity Module
//!
//! The did:valyu method itself: identifier records, DID strings, document
//! rendering, construction and resolution.
//!
//! 1. **Types**: `Identifier`, `Key`, `Service`: the stored records.
//! 2. **DID**: the two identifier formats and their classification.
//! 3. **Address**: Ethereum address derivation for user DIDs.
//! 4. **Document**: user and data DID Document projections.
//! 5. **Provider**: builds new identifiers from `CreateOptions`.
//! 6. **Resolver**: fail-closed resolution to a `ResolutionResult`.

pub mod address;
pub mod did;
pub mod document;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod types;

pub use address::{derive_ethereum_address, AddressError};
pub use did::{data_did, user_did, DidVariant};
pub use document::{DidDocument, RenderError, ServiceEndpoint, VerificationMethod};
pub use error::DidError;
pub use provider::{CreateOptions, ValyuDidProvider};
pub use resolver::{DidResolver, ResolutionErrorKind, ResolutionResult, Resolver, ValyuDidResolver};
pub use types::{Identifier, Key, KeyMeta, Service};
