//! Wallet metadata list and derivation index counter.
//!
//! Metadata is public (names, indices, addresses) and stored as plain
//! JSON. The counter is the next derivation index to hand out; it only
//! ever grows, so indices of removed wallets are never reissued.

use forest_types::{ForestError, Result};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};

use crate::engine::StorageEngine;
use crate::json_tree::{decode, encode, JsonSlot};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Storage key of the ordered wallet list.
pub const KEY_WALLETS: &str = "wallets";

/// Storage key of the derivation index counter.
pub const KEY_INDEX_COUNTER: &str = "wallet_index_counter";

// ---------------------------------------------------------------------------
// StoredWalletMetadata
// ---------------------------------------------------------------------------

/// Public description of one materialized HD account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWalletMetadata {
    /// Opaque unique id (hex).
    pub id: String,
    /// User-facing label.
    pub name: String,
    /// BIP-44 address index.
    pub derivation_index: u32,
    /// EIP-55 address at `derivation_index`.
    pub address: String,
}

// ---------------------------------------------------------------------------
// WalletMetadataStore
// ---------------------------------------------------------------------------

/// Access to the wallet list and index counter.
pub struct WalletMetadataStore<'a> {
    tree: &'a sled::Tree,
    list: JsonSlot<'a, Vec<StoredWalletMetadata>>,
    counter: JsonSlot<'a, u32>,
}

impl<'a> WalletMetadataStore<'a> {
    /// Creates a new `WalletMetadataStore`.
    pub(crate) fn new(engine: &'a StorageEngine) -> Self {
        Self {
            tree: engine.tree(),
            list: JsonSlot::new(engine.tree(), KEY_WALLETS),
            counter: JsonSlot::new(engine.tree(), KEY_INDEX_COUNTER),
        }
    }

    /// Returns all wallets in creation order; empty if none were saved.
    pub fn list(&self) -> Result<Vec<StoredWalletMetadata>> {
        Ok(self.list.load()?.unwrap_or_default())
    }

    /// Replaces the whole list.
    pub fn save_list(&self, wallets: &[StoredWalletMetadata]) -> Result<()> {
        self.list.store(&wallets.to_vec())
    }

    /// Returns the next index to hand out (0 if never set).
    pub fn counter(&self) -> Result<u32> {
        Ok(self.counter.load()?.unwrap_or(0))
    }

    /// Overwrites the counter.
    pub fn set_counter(&self, value: u32) -> Result<()> {
        self.counter.store(&value)
    }

    /// Atomically returns the current counter and advances it by one.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::StorageError`] on I/O failure, a corrupt
    /// counter, or overflow.
    pub fn reserve_index(&self) -> Result<u32> {
        let (previous, _) = self.update_counter(|current| {
            current
                .checked_add(1)
                .ok_or_else(|| "derivation index counter overflow".to_string())
        })?;
        Ok(previous)
    }

    /// Atomically raises the counter to at least `floor`.
    ///
    /// Returns the counter value after the update.
    pub fn raise_counter_to(&self, floor: u32) -> Result<u32> {
        let (_, next) = self.update_counter(|current| Ok(current.max(floor)))?;
        Ok(next)
    }

    /// Removes the list and the counter. Returns `true` if either existed.
    pub fn clear(&self) -> Result<bool> {
        let had_list = self.list.clear()?;
        let had_counter = self.counter.clear()?;
        Ok(had_list || had_counter)
    }

    /// Read-modify-write of the counter inside a sled transaction.
    fn update_counter<F>(&self, step: F) -> Result<(u32, u32)>
    where
        F: Fn(u32) -> std::result::Result<u32, String>,
    {
        let key = self.counter.key();
        let outcome = self.tree.transaction(|tx| {
            let current = match tx.get(key)? {
                Some(raw) => decode::<u32>(key, &raw)
                    .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?,
                None => 0,
            };
            let next = step(current).map_err(ConflictableTransactionError::Abort)?;
            if next != current {
                let encoded =
                    encode(key, &next).map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
                tx.insert(key, encoded)?;
            }
            Ok((current, next))
        });

        outcome.map_err(|e: TransactionError<String>| match e {
            TransactionError::Abort(reason) => ForestError::StorageError { reason },
            TransactionError::Storage(e) => ForestError::StorageError {
                reason: format!("sled transaction on '{key}' failed: {e}"),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
