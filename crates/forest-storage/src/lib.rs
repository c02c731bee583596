//! Persistent storage for the Forest vault core.
//!
//! A single sled tree holds the sealed vault record, the ordered wallet
//! metadata list, and the derivation index counter, each as JSON. This
//! crate performs no cryptography: the vault record arrives already
//! sealed.

pub mod engine;
pub mod json_tree;
pub mod vault_record;
pub mod wallets;

pub use engine::StorageEngine;
pub use vault_record::{StoredKdfParams, VaultRecord, VaultRecordStore};
pub use wallets::{StoredWalletMetadata, WalletMetadataStore};
