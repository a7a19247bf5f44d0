//! # Method Configuration & Constants
//!
//! Every fixed string and size in did:valyu lives here. Identifiers minted
//! with these values are already stored and resolved by other parties, so
//! changing any of them is a breaking change to the method.

// ---------------------------------------------------------------------------
// DID Method
// ---------------------------------------------------------------------------

/// DID method name, the second segment of every identifier.
pub const DID_METHOD: &str = "valyu";

/// Provider tag stored alongside each identifier record.
pub const DID_PROVIDER: &str = "did:valyu";

/// Prefix for user identifiers. Followed by a `0x`-prefixed Ethereum address.
pub const USER_DID_PREFIX: &str = "did:valyu:user:";

/// Prefix for data identifiers. Followed by `<chainId><dataTokenAddress>`.
pub const DATA_DID_PREFIX: &str = "did:valyu:data:";

/// Substring that classifies a DID as a user identifier.
pub const USER_DID_MARKER: &str = ":user:";

/// Substring that classifies a DID as a data identifier.
pub const DATA_DID_MARKER: &str = ":data:";

/// The only accepted `didType` value in untyped creation options.
pub const USER_DID_TYPE: &str = "user";

// ---------------------------------------------------------------------------
// DID Document
// ---------------------------------------------------------------------------

/// JSON-LD context for W3C DID Core documents.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Content type reported in successful resolution metadata.
pub const DID_CONTENT_TYPE: &str = "application/did+ld+json";

/// Fragment of the signing key in a user document.
pub const USER_SIGNING_KEY_FRAGMENT: &str = "ethereum-key-1";

/// Fragment of the token-binding key in a data document.
pub const DATA_SIGNING_KEY_FRAGMENT: &str = "key-1";

/// Fragment of the key-agreement key in both document shapes.
pub const KEY_AGREEMENT_FRAGMENT: &str = "key-exchange-1";

/// Fragment of the access service in a data document.
pub const ACCESS_SERVICE_FRAGMENT: &str = "access";

/// Stored id of the access service on a data identifier.
pub const DATA_SERVICE_ID: &str = "valyu";

/// Stored type of the access service on a data identifier.
pub const DATA_SERVICE_TYPE: &str = "Access";

// ---------------------------------------------------------------------------
// Key Management
// ---------------------------------------------------------------------------

/// Name of the in-process key management backend.
pub const DEFAULT_KMS: &str = "local";

/// Uncompressed SEC1 point marker, as it appears at the start of a hex key.
pub const UNCOMPRESSED_KEY_PREFIX: &str = "04";

/// Uncompressed secp256k1 public key length: marker byte plus X and Y.
pub const SECP256K1_PUBLIC_KEY_LENGTH: usize = 65;

/// secp256k1 secret scalar length.
pub const SECP256K1_SECRET_KEY_LENGTH: usize = 32;

/// X25519 public and secret key length.
pub const X25519_KEY_LENGTH: usize = 32;

/// Keccak-256 digest length.
pub const KECCAK_OUTPUT_LENGTH: usize = 32;

/// Ethereum address length: the trailing bytes of the Keccak-256 digest.
pub const ETHEREUM_ADDRESS_LENGTH: usize = 20;

/// AES-256-GCM key length, used to seal private keys at rest.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length.
pub const AES_NONCE_LENGTH: usize = 12;

/// Domain-separation context for deriving the key-store sealing key from the
/// operator's KMS secret.
pub const KMS_SEAL_CONTEXT: &str = "did:valyu 2024-05-01 local kms private key seal";
