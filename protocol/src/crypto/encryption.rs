//! # AES-256-GCM Sealing
//!
//! Authenticated encryption for private key material held by the local KMS.
//! Every sealed blob is bound to the kid it belongs to through the
//! associated data, so a ciphertext copied under a different kid fails to
//! open.
//!
//! ## Nonce management
//!
//! Nonces are 96 random bits from `OsRng`. Each private key is sealed once,
//! so the birthday bound is nowhere in sight.
//!
//! ## Wire format
//!
//! [`seal`] returns `nonce || ciphertext` as a single `Vec<u8>`. The first
//! 12 bytes are the nonce, the rest is the ciphertext plus the 16-byte tag.
//! [`open`] expects the same layout.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH};

/// Errors that can occur while sealing or opening key material.
///
/// "Wrong key" and "corrupted ciphertext" are deliberately the same error.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("invalid key length: expected {AES_KEY_LENGTH} bytes")]
    InvalidKeyLength,

    #[error("ciphertext too short: must be at least {AES_NONCE_LENGTH} bytes")]
    CiphertextTooShort,
}

/// Seal `plaintext` under `key`, authenticating `aad` alongside it.
///
/// Returns `nonce || ciphertext`.
///
/// # Example
///
/// ```
/// use valyu_did::crypto::encryption::{open, seal};
///
/// let key = [0x42u8; 32];
/// let sealed = seal(&key, b"secret scalar", b"kid-1").unwrap();
/// assert_eq!(open(&key, &sealed, b"kid-1").unwrap(), b"secret scalar");
/// ```
pub fn seal(
    key: &[u8; AES_KEY_LENGTH],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a blob produced by [`seal`]. The `aad` must match exactly.
pub fn open(key: &[u8; AES_KEY_LENGTH], data: &[u8], aad: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < AES_NONCE_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let (nonce_bytes, ciphertext) = data.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::DecryptFailed)
}

/// Parse a sealing key from a byte slice of unknown length.
///
/// Used when the key comes from operator configuration.
pub fn key_from_slice(bytes: &[u8]) -> Result<[u8; AES_KEY_LENGTH], EncryptionError> {
    bytes
        .try_into()
        .map_err(|_| EncryptionError::InvalidKeyLength)
}
