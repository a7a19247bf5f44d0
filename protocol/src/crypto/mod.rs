//! # Cryptographic Primitives
//!
//! Thin, typed wrappers around audited implementations:
//!
//! - **secp256k1** (`k256`) for primary keys.
//! - **X25519** (`x25519-dalek`) for key agreement.
//! - **Keccak-256** (`ethers-core`) for Ethereum address derivation.
//! - **AES-256-GCM** for sealing private keys at rest, keyed through
//!   **BLAKE3** `derive_key`.

pub mod encryption;
pub mod hash;
pub mod keys;

pub use encryption::{open, seal};
pub use hash::{derive_key, keccak256};
pub use keys::{KeyMaterial, KeyType};
