//! # DID Documents
//!
//! Read-only projections of stored [`Identifier`]s in one of two shapes.
//!
//! User document:
//!
//! ```text
//! { @context, id, controller,
//!   verificationMethod: [ <did>#ethereum-key-1 ],
//!   authentication:     [ "<did>#ethereum-key-1" ],
//!   keyAgreement:       [ <did>#key-exchange-1 ] }
//! ```
//!
//! Data document:
//!
//! ```text
//! { @context, id, controller,
//!   verificationMethod: [ <did>#key-1 ],
//!   assertionMethod:    [ "<did>#key-1" ],
//!   keyAgreement:       [ <did>#key-exchange-1 ],
//!   service:            [ <did>#access ] }
//! ```
//!
//! Rendering is a pure function of the record: resolving the same record
//! twice yields identical documents. The document-level `controller` is the
//! identifier's controller key id; each verification method's `controller`
//! is the DID itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::did::DidVariant;
use super::types::{Identifier, Key};
use crate::config::{
    ACCESS_SERVICE_FRAGMENT, DATA_SIGNING_KEY_FRAGMENT, DID_CONTEXT, KEY_AGREEMENT_FRAGMENT,
    USER_SIGNING_KEY_FRAGMENT,
};

/// A stored record could not be projected into a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("identifier {did} has no key at index {index}")]
    MissingKey { did: String, index: usize },

    #[error("data identifier {did} has no service")]
    MissingService { did: String },
}

/// A key entry in `verificationMethod` or `keyAgreement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(rename = "publicKeyHex")]
    pub public_key_hex: String,
}

/// A service entry in a data document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

/// Document for a user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDidDocument {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    pub controller: String,
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    #[serde(rename = "keyAgreement")]
    pub key_agreement: Vec<VerificationMethod>,
}

/// Document for a data identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDidDocument {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    pub controller: String,
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(rename = "assertionMethod")]
    pub assertion_method: Vec<String>,
    #[serde(rename = "keyAgreement")]
    pub key_agreement: Vec<VerificationMethod>,
    pub service: Vec<ServiceEndpoint>,
}

/// Either document shape. Serializes without a tag, exactly as the inner
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DidDocument {
    User(UserDidDocument),
    Data(DataDidDocument),
}

impl DidDocument {
    /// Render `identifier` in the shape for `variant`.
    pub fn render(identifier: &Identifier, variant: DidVariant) -> Result<Self, RenderError> {
        match variant {
            DidVariant::User => render_user(identifier).map(DidDocument::User),
            DidVariant::Data => render_data(identifier).map(DidDocument::Data),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DidDocument::User(doc) => &doc.id,
            DidDocument::Data(doc) => &doc.id,
        }
    }

    pub fn controller(&self) -> &str {
        match self {
            DidDocument::User(doc) => &doc.controller,
            DidDocument::Data(doc) => &doc.controller,
        }
    }

    pub fn variant(&self) -> DidVariant {
        match self {
            DidDocument::User(_) => DidVariant::User,
            DidDocument::Data(_) => DidVariant::Data,
        }
    }

    pub fn verification_method(&self) -> &[VerificationMethod] {
        match self {
            DidDocument::User(doc) => &doc.verification_method,
            DidDocument::Data(doc) => &doc.verification_method,
        }
    }

    pub fn key_agreement(&self) -> &[VerificationMethod] {
        match self {
            DidDocument::User(doc) => &doc.key_agreement,
            DidDocument::Data(doc) => &doc.key_agreement,
        }
    }

    /// Services; always empty for user documents.
    pub fn service(&self) -> &[ServiceEndpoint] {
        match self {
            DidDocument::User(_) => &[],
            DidDocument::Data(doc) => &doc.service,
        }
    }
}

fn key_at<'a>(identifier: &'a Identifier, index: usize) -> Result<&'a Key, RenderError> {
    identifier.keys.get(index).ok_or_else(|| RenderError::MissingKey {
        did: identifier.did.clone(),
        index,
    })
}

fn method(did: &str, fragment: &str, key: &Key) -> VerificationMethod {
    VerificationMethod {
        id: format!("{did}#{fragment}"),
        type_: key.key_type.as_str().to_string(),
        controller: did.to_string(),
        public_key_hex: key.public_key_hex.clone(),
    }
}

fn render_user(identifier: &Identifier) -> Result<UserDidDocument, RenderError> {
    let did = &identifier.did;
    let primary = key_at(identifier, 0)?;
    let agreement = key_at(identifier, 1)?;

    Ok(UserDidDocument {
        context: DID_CONTEXT.to_string(),
        id: did.clone(),
        controller: identifier.controller_key_id.clone(),
        verification_method: vec![method(did, USER_SIGNING_KEY_FRAGMENT, primary)],
        authentication: vec![format!("{did}#{USER_SIGNING_KEY_FRAGMENT}")],
        key_agreement: vec![method(did, KEY_AGREEMENT_FRAGMENT, agreement)],
    })
}

fn render_data(identifier: &Identifier) -> Result<DataDidDocument, RenderError> {
    let did = &identifier.did;
    let primary = key_at(identifier, 0)?;
    let agreement = key_at(identifier, 1)?;
    let service = identifier
        .services
        .first()
        .ok_or_else(|| RenderError::MissingService { did: did.clone() })?;

    Ok(DataDidDocument {
        context: DID_CONTEXT.to_string(),
        id: did.clone(),
        controller: identifier.controller_key_id.clone(),
        verification_method: vec![method(did, DATA_SIGNING_KEY_FRAGMENT, primary)],
        assertion_method: vec![format!("{did}#{DATA_SIGNING_KEY_FRAGMENT}")],
        key_agreement: vec![method(did, KEY_AGREEMENT_FRAGMENT, agreement)],
        service: vec![ServiceEndpoint {
            id: format!("{did}#{ACCESS_SERVICE_FRAGMENT}"),
            type_: service.service_type.clone(),
            service_endpoint: service.service_endpoint.clone(),
        }],
    })
}
