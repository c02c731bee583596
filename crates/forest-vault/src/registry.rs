//! Registry of materialized HD wallets.
//!
//! Tracks which derivation indices have been turned into named wallets.
//! Holds no secrets: ids, names, indices and addresses only.
//!
//! The next index comes from a persisted counter that only grows, so a
//! removed wallet's index is never handed out again.

use std::sync::{Arc, Mutex, MutexGuard};

use forest_crypto::mnemonic::Mnemonic;
use forest_storage::{StorageEngine, StoredWalletMetadata};
use forest_types::{Address, ForestError, Result};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::account::{derive_account, Account};

/// Random bytes in a wallet id (hex-encoded to 32 characters).
const WALLET_ID_LEN: usize = 16;

// ---------------------------------------------------------------------------
// WalletRegistry
// ---------------------------------------------------------------------------

/// Ordered, persisted list of wallet metadata.
///
/// Read-modify-write sequences run under an internal lock; clone the
/// surrounding `Arc` to share one registry between tasks.
pub struct WalletRegistry {
    engine: Arc<StorageEngine>,
    write_lock: Mutex<()>,
}

impl WalletRegistry {
    /// Creates a registry over `engine`.
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self {
            engine,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns all wallets in creation order.
    pub fn list_wallets(&self) -> Result<Vec<StoredWalletMetadata>> {
        self.engine.wallets().list()
    }

    /// Returns the wallet with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::WalletNotFound`] if no such wallet exists.
    pub fn get_wallet(&self, id: &str) -> Result<StoredWalletMetadata> {
        self.list_wallets()?
            .into_iter()
            .find(|w| w.id == id)
            .ok_or_else(|| ForestError::WalletNotFound { id: id.to_string() })
    }

    /// Inserts `meta`, or replaces the entry with the same id in place.
    ///
    /// The index counter is raised past `meta.derivation_index`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::ConfigError`] if another wallet already
    /// uses the same derivation index.
    pub fn save_wallet(&self, meta: StoredWalletMetadata) -> Result<()> {
        let _guard = self.lock()?;
        let store = self.engine.wallets();
        let mut wallets = store.list()?;

        if let Some(other) = wallets
            .iter()
            .find(|w| w.derivation_index == meta.derivation_index && w.id != meta.id)
        {
            return Err(ForestError::ConfigError {
                reason: format!(
                    "derivation index {} already used by wallet {}",
                    meta.derivation_index, other.id
                ),
            });
        }

        let index = meta.derivation_index;
        match wallets.iter_mut().find(|w| w.id == meta.id) {
            Some(existing) => *existing = meta,
            None => wallets.push(meta),
        }

        store.save_list(&wallets)?;
        store.raise_counter_to(index.saturating_add(1))?;
        Ok(())
    }

    /// Removes the wallet with `id`. Returns `false` if it did not exist.
    ///
    /// The counter is left untouched.
    pub fn remove_wallet(&self, id: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let store = self.engine.wallets();
        let mut wallets = store.list()?;
        let before = wallets.len();
        wallets.retain(|w| w.id != id);
        if wallets.len() == before {
            return Ok(false);
        }
        store.save_list(&wallets)?;
        tracing::info!(wallet_id = %id, "wallet removed");
        Ok(true)
    }

    /// Reserves and returns the next unused derivation index.
    ///
    /// Lists written before the counter existed are honoured: the
    /// counter is first raised past the highest saved index.
    pub fn next_derivation_index(&self) -> Result<u32> {
        let _guard = self.lock()?;
        let store = self.engine.wallets();
        let floor = store
            .list()?
            .iter()
            .map(|w| w.derivation_index.saturating_add(1))
            .max()
            .unwrap_or(0);
        store.raise_counter_to(floor)?;
        store.reserve_index()
    }

    /// Builds metadata for `account` under a fresh random id and saves it.
    pub fn register_account(&self, name: &str, account: &Account) -> Result<StoredWalletMetadata> {
        let meta = StoredWalletMetadata {
            id: generate_wallet_id()?,
            name: name.to_string(),
            derivation_index: account.index(),
            address: account.address(),
        };
        self.save_wallet(meta.clone())?;
        tracing::info!(
            wallet_id = %meta.id,
            index = meta.derivation_index,
            address = %meta.address,
            "wallet registered"
        );
        Ok(meta)
    }

    /// Returns the ids of wallets whose stored address differs from the
    /// one derived from `mnemonic` at their index.
    pub fn verify_addresses(&self, mnemonic: &Mnemonic) -> Result<Vec<String>> {
        let mut mismatched = Vec::new();
        for wallet in self.list_wallets()? {
            let index = wallet.derivation_index;
            let expected = derive_account(mnemonic, index)?;
            let matches = wallet
                .address
                .parse::<Address>()
                .map(|stored| expected.raw_address() == &stored)
                .unwrap_or(false);
            if !matches {
                tracing::warn!(wallet_id = %wallet.id, index, "stored address does not match derivation");
                mismatched.push(wallet.id);
            }
        }
        Ok(mismatched)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| ForestError::StorageError {
            reason: "wallet registry lock poisoned".into(),
        })
    }
}

/// Generates a random hex wallet id.
fn generate_wallet_id() -> Result<String> {
    let mut bytes = [0u8; WALLET_ID_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ForestError::CryptoError {
            reason: format!("failed to generate wallet id: {e}"),
        })?;
    Ok(hex::encode(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
