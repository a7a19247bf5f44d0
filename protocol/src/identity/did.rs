//! # did:valyu Identifier Strings
//!
//! ## DID Format
//!
//! ```text
//! did:valyu:user:<0x + 40 hex chars>         user identity
//! did:valyu:data:<chainId><dataTokenAddress> data identity
//! ```
//!
//! The data suffix is a plain concatenation with no separator, so
//! `("1", "0xAB")` and `("10", "xAB")` collide and the chain id cannot be
//! recovered from the string. Existing identifiers depend on this exact
//! format; nothing in this crate splits the suffix apart.
//!
//! Classification is by substring, not by prefix: any string containing
//! `:user:` is a user DID, otherwise any string containing `:data:` is a
//! data DID.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DATA_DID_MARKER, DATA_DID_PREFIX, USER_DID_MARKER, USER_DID_PREFIX};

/// The two identifier kinds, each with its own DID format and document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidVariant {
    User,
    Data,
}

impl DidVariant {
    /// Classify a DID string. `None` when it carries neither marker.
    pub fn classify(did: &str) -> Option<Self> {
        if did.contains(USER_DID_MARKER) {
            Some(DidVariant::User)
        } else if did.contains(DATA_DID_MARKER) {
            Some(DidVariant::Data)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DidVariant::User => "user",
            DidVariant::Data => "data",
        }
    }
}

impl fmt::Display for DidVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a user DID from an Ethereum address (already `0x`-prefixed).
pub fn user_did(ethereum_address: &str) -> String {
    format!("{USER_DID_PREFIX}{ethereum_address}")
}

/// Build a data DID from a chain id and a data token address.
pub fn data_did(chain_id: &str, data_token_address: &str) -> String {
    format!("{DATA_DID_PREFIX}{chain_id}{data_token_address}")
}
