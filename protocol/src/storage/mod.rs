//! # Storage Module
//!
//! Persistence for identifier records and sealed private keys.
//!
//! ```text
//! store.rs: IdentifierStore trait (the seam the core depends on)
//! db.rs   : DidStore, the sled implementation
//! ```
//!
//! Records are bincode on disk. JSON is only for APIs and debugging.

pub mod db;
pub mod store;

pub use db::{DidStore, StoreError, StoreResult};
pub use store::IdentifierStore;
