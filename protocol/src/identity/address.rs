//! Ethereum address derivation for user identifiers.
//!
//! `address = "0x" || hex(keccak256(pubkey_without_04)[12..32])`
//!
//! The byte slicing must stay exactly as is: existing user DIDs embed
//! addresses computed this way.

use thiserror::Error;

use crate::config::{ETHEREUM_ADDRESS_LENGTH, KECCAK_OUTPUT_LENGTH, UNCOMPRESSED_KEY_PREFIX};
use crate::crypto::keccak256;

/// Errors from address derivation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("public key is not valid hex: {0}")]
    InvalidHex(String),
}

/// Derive the `0x`-prefixed, lowercase Ethereum address for a public key.
///
/// A leading `04` (uncompressed SEC1 marker) is stripped before hashing.
/// The remaining bytes are hashed as-is; no curve validation happens here.
///
/// # Example
///
/// ```
/// use valyu_did::identity::derive_ethereum_address;
///
/// let addr = derive_ethereum_address("04").unwrap();
/// // keccak256("") = c5d2...a470; last 20 bytes:
/// assert_eq!(addr, "0xdcc703c0e500b653ca82273b7bfad8045d85a470");
/// ```
pub fn derive_ethereum_address(public_key_hex: &str) -> Result<String, AddressError> {
    let stripped = public_key_hex
        .strip_prefix(UNCOMPRESSED_KEY_PREFIX)
        .unwrap_or(public_key_hex);

    let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    let digest = keccak256(&bytes);

    Ok(format!(
        "0x{}",
        hex::encode(&digest[KECCAK_OUTPUT_LENGTH - ETHEREUM_ADDRESS_LENGTH..])
    ))
}
