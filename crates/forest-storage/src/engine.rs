//! Core storage engine: database lifecycle and tree access.
//!
//! The [`StorageEngine`] owns the sled database and the single `forest`
//! tree holding every persisted record. Stores borrow the engine and
//! address their own keys inside that tree.

use std::path::Path;

use forest_types::{ForestError, Result};

use crate::vault_record::VaultRecordStore;
use crate::wallets::WalletMetadataStore;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name of the sled tree holding all Forest records.
pub const TREE_NAME: &str = "forest";

// ---------------------------------------------------------------------------
// StorageEngine
// ---------------------------------------------------------------------------

/// Embedded key-value storage backed by sled.
///
/// Values are JSON documents. Nothing stored through the engine is
/// secret in plaintext form: the vault record is already sealed by the
/// caller, and wallet metadata holds only public data.
///
/// # Keys (tree `forest`)
///
/// - `vault`: the sealed vault record
/// - `wallets`: ordered wallet metadata list
/// - `wallet_index_counter`: next derivation index to hand out
pub struct StorageEngine {
    db: sled::Db,
    tree: sled::Tree,
}

impl StorageEngine {
    /// Opens (or creates) the storage engine at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::StorageError`] if the database or tree
    /// cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path).map_err(|e| ForestError::StorageError {
            reason: format!("failed to open sled database at {}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "storage opened");
        Self::from_db(db)
    }

    /// Opens an in-memory database that is discarded on drop.
    ///
    /// Used by tests and by callers that want a throwaway vault.
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ForestError::StorageError {
                reason: format!("failed to open temporary sled database: {e}"),
            })?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let tree = db.open_tree(TREE_NAME).map_err(|e| ForestError::StorageError {
            reason: format!("failed to open tree '{TREE_NAME}': {e}"),
        })?;
        Ok(Self { db, tree })
    }

    /// Flushes all pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::StorageError`] if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.db.flush().map_err(|e| ForestError::StorageError {
            reason: format!("failed to flush database: {e}"),
        })?;
        Ok(())
    }

    /// Removes every Forest record and flushes.
    ///
    /// Irreversible. Returns the number of keys removed.
    pub fn wipe(&self) -> Result<usize> {
        let removed = self.tree.len();
        self.tree.clear().map_err(|e| ForestError::StorageError {
            reason: format!("failed to clear tree '{TREE_NAME}': {e}"),
        })?;
        self.flush()?;
        Ok(removed)
    }

    /// Returns the shared `forest` tree (crate-internal).
    pub(crate) fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    /// Returns a [`VaultRecordStore`] for this engine.
    pub fn vault_records(&self) -> VaultRecordStore<'_> {
        VaultRecordStore::new(self)
    }

    /// Returns a [`WalletMetadataStore`] for this engine.
    pub fn wallets(&self) -> WalletMetadataStore<'_> {
        WalletMetadataStore::new(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_engine_starts_empty() -> std::result::Result<(), ForestError> {
        let engine = StorageEngine::open_temporary()?;
        assert!(engine.tree().is_empty());
        engine.flush()?;
        Ok(())
    }

    #[test]
    fn wipe_removes_all_records() -> std::result::Result<(), ForestError> {
        let engine = StorageEngine::open_temporary()?;
        engine.wallets().set_counter(3)?;
        engine.wallets().save_list(&[])?;
        assert_eq!(engine.wipe()?, 2);
        assert!(engine.tree().is_empty());
        assert_eq!(engine.wipe()?, 0);
        Ok(())
    }

    #[test]
    fn reopen_on_disk_keeps_records() -> std::result::Result<(), ForestError> {
        let tmp = tempfile::tempdir().map_err(|e| ForestError::StorageError {
            reason: e.to_string(),
        })?;
        let dir = tmp.path().join("db");

        {
            let engine = StorageEngine::open(&dir)?;
            engine.wallets().set_counter(7)?;
            engine.flush()?;
        }
        {
            let engine = StorageEngine::open(&dir)?;
            assert_eq!(engine.wallets().counter()?, 7);
        }
        Ok(())
    }
}
