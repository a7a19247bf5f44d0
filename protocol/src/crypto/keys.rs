//! # Key Material
//!
//! Key pair generation for the two algorithms a did:valyu identifier uses:
//!
//! - **secp256k1**: the primary key. For user identifiers it doubles as an
//!   Ethereum account key, so the public half is exported as an uncompressed
//!   SEC1 point (`04 || X || Y`, 65 bytes) which is what address derivation
//!   expects.
//! - **X25519**: the key-agreement key, 32-byte Montgomery public key.
//!
//! Secret bytes only leave this module on their way into the KMS sealing
//! path. `KeyMaterial`'s `Debug` impl redacts them.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::config::{SECP256K1_SECRET_KEY_LENGTH, X25519_KEY_LENGTH};

/// Errors that can occur while building key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes for {0}")]
    InvalidSecretKey(KeyType),

    #[error("unknown key type: {0}")]
    UnknownKeyType(String),
}

/// The algorithm (and role) of a key held by an identifier.
///
/// Serialized with the short algorithm names, which are also the `type`
/// values rendered into DID Documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// secp256k1 signing key. Primary key of every identifier.
    #[serde(rename = "Secp256k1")]
    SigningSecp256k1,
    /// X25519 key-agreement key. Second key of every identifier.
    #[serde(rename = "X25519")]
    KeyAgreementX25519,
}

impl KeyType {
    /// The algorithm name as stored and rendered.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::SigningSecp256k1 => "Secp256k1",
            KeyType::KeyAgreementX25519 => "X25519",
        }
    }

    /// Operations a key of this type is usable for.
    pub fn algorithms(&self) -> Vec<String> {
        let algs: &[&str] = match self {
            KeyType::SigningSecp256k1 => &[
                "ES256K",
                "ES256K-R",
                "eth_signTransaction",
                "eth_signTypedData",
                "eth_signMessage",
                "eth_rawSign",
            ],
            KeyType::KeyAgreementX25519 => &["ECDH", "ECDH-ES", "ECDH-1PU"],
        };
        algs.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Secp256k1" => Ok(KeyType::SigningSecp256k1),
            "X25519" => Ok(KeyType::KeyAgreementX25519),
            other => Err(KeyError::UnknownKeyType(other.to_string())),
        }
    }
}

/// A freshly generated (or imported) key pair.
///
/// Does not implement `Serialize`. Persisting the secret goes through the
/// KMS, which seals it first.
pub struct KeyMaterial {
    key_type: KeyType,
    public_key: Vec<u8>,
    secret_key: [u8; 32],
}

impl KeyMaterial {
    /// Generate a new key pair of `key_type` from the OS RNG.
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::SigningSecp256k1 => {
                let secret = k256::SecretKey::random(&mut OsRng);
                Self::from_secp256k1(secret)
            }
            KeyType::KeyAgreementX25519 => {
                let secret = StaticSecret::random_from_rng(OsRng);
                Self::from_x25519(secret)
            }
        }
    }

    /// Rebuild a key pair from raw secret bytes.
    pub fn from_secret(key_type: KeyType, secret: &[u8]) -> Result<Self, KeyError> {
        match key_type {
            KeyType::SigningSecp256k1 => {
                if secret.len() != SECP256K1_SECRET_KEY_LENGTH {
                    return Err(KeyError::InvalidSecretKey(key_type));
                }
                let secret = k256::SecretKey::from_slice(secret)
                    .map_err(|_| KeyError::InvalidSecretKey(key_type))?;
                Ok(Self::from_secp256k1(secret))
            }
            KeyType::KeyAgreementX25519 => {
                let bytes: [u8; X25519_KEY_LENGTH] = secret
                    .try_into()
                    .map_err(|_| KeyError::InvalidSecretKey(key_type))?;
                Ok(Self::from_x25519(StaticSecret::from(bytes)))
            }
        }
    }

    fn from_secp256k1(secret: k256::SecretKey) -> Self {
        let public_key = secret
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        Self {
            key_type: KeyType::SigningSecp256k1,
            public_key,
            secret_key: secret.to_bytes().into(),
        }
    }

    fn from_x25519(secret: StaticSecret) -> Self {
        let public_key = X25519PublicKey::from(&secret).as_bytes().to_vec();
        Self {
            key_type: KeyType::KeyAgreementX25519,
            public_key,
            secret_key: secret.to_bytes(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Public key bytes (65-byte SEC1 point or 32-byte X25519 key).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Lowercase hex of the public key, without a `0x` prefix.
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    /// Raw secret bytes. Only the KMS sealing path should call this.
    pub fn secret_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_type", &self.key_type)
            .field("public_key", &self.public_key_hex())
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
