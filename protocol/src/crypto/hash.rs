//! # Hashing Utilities
//!
//! Two hash functions, each with exactly one job:
//!
//! - **Keccak-256**: Ethereum's hash. Used only to derive user addresses
//!   from secp256k1 public keys, where interoperability with Ethereum tooling
//!   is the entire point.
//! - **BLAKE3** (`derive_key` mode): turns the operator's KMS secret into
//!   the AES key that seals private material at rest.
//!
//! Note that Keccak-256 is *not* NIST SHA3-256; the padding differs. The
//! implementation comes from `ethers-core` so it matches what every
//! Ethereum client computes.

use ethers_core::utils::keccak256 as ethers_keccak256;

use crate::config::{AES_KEY_LENGTH, KECCAK_OUTPUT_LENGTH};

/// Compute the Keccak-256 digest of `data`.
///
/// # Example
///
/// ```
/// use valyu_did::crypto::keccak256;
///
/// let digest = keccak256(b"");
/// assert_eq!(
///     hex::encode(digest),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; KECCAK_OUTPUT_LENGTH] {
    ethers_keccak256(data)
}

/// Derive a 32-byte key from `material` under a domain-separation `context`.
///
/// Different contexts yield independent keys from the same material.
pub fn derive_key(context: &str, material: &[u8]) -> [u8; AES_KEY_LENGTH] {
    blake3::derive_key(context, material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty_input_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_is_not_sha3() {
        // SHA3-256("") = a7ffc6f8bf1ed766...; Keccak-256 must differ.
        assert!(!hex::encode(keccak256(b"")).starts_with("a7ffc6f8"));
    }

    #[test]
    fn test_keccak256_deterministic() {
        assert_eq!(keccak256(b"did:valyu"), keccak256(b"did:valyu"));
        assert_ne!(keccak256(b"did:valyu"), keccak256(b"did:valyU"));
    }

    #[test]
    fn test_derive_key_domain_separation() {
        let material = [9u8; 32];
        let a = derive_key("context a", &material);
        let b = derive_key("context b", &material);
        assert_ne!(a, b);
        assert_eq!(a, derive_key("context a", &material));
    }
}
