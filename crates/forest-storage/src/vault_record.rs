//! The sealed vault record.
//!
//! Exactly one record exists per store. It never contains plaintext:
//! `enc` is the AES-256-GCM ciphertext (tag appended) of the mnemonic.

use forest_types::config::check_scrypt_cost;
use forest_types::{ForestError, Result};
use serde::{Deserialize, Serialize};

use crate::engine::StorageEngine;
use crate::json_tree::JsonSlot;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Storage key of the vault record.
pub const KEY_VAULT: &str = "vault";

/// Records sealed with the fixed legacy salt; `salt` is absent.
pub const VAULT_VERSION_LEGACY: u32 = 1;

/// Records sealed with a random per-vault salt.
pub const VAULT_VERSION_CURRENT: u32 = 2;

/// Byte length of the per-vault salt in current records.
pub const RECORD_SALT_LEN: usize = 32;

// ---------------------------------------------------------------------------
// StoredKdfParams
// ---------------------------------------------------------------------------

/// scrypt cost parameters a record was sealed with.
///
/// Stored alongside current records so a later change of the configured
/// cost does not lock existing vaults out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKdfParams {
    /// log2 of the scrypt cost N.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

// ---------------------------------------------------------------------------
// VaultRecord
// ---------------------------------------------------------------------------

/// Persisted form of the encrypted mnemonic.
///
/// ```json
/// { "version": 2, "enc": [..], "iv": [..12], "salt": [..32],
///   "kdf": { "log_n": 15, "r": 8, "p": 1 } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    /// Record format version.
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// Ciphertext with the 16-byte GCM tag appended.
    pub enc: Vec<u8>,
    /// 12-byte AES-GCM IV.
    pub iv: Vec<u8>,
    /// Per-vault scrypt salt; `None` for legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Vec<u8>>,
    /// scrypt parameters; `None` means the fixed legacy cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<StoredKdfParams>,
}

fn legacy_version() -> u32 {
    VAULT_VERSION_LEGACY
}

fn corrupted(reason: String) -> ForestError {
    ForestError::AuthenticationFailure {
        reason: format!("corrupted vault record: {reason}"),
    }
}

impl VaultRecord {
    /// Returns `true` if this record predates per-vault salts and must
    /// be re-sealed after the next successful unlock.
    pub fn is_legacy(&self) -> bool {
        self.version < VAULT_VERSION_CURRENT || self.salt.is_none()
    }

    /// Checks the record is structurally sound before any crypto runs.
    ///
    /// Every field is untrusted: a stored scrypt cost outside the
    /// configurable bounds is refused here, before any allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::AuthenticationFailure`] on an unknown
    /// version, a missing or wrong-length salt, or an out-of-bounds
    /// scrypt cost.
    pub fn validate(&self) -> Result<()> {
        if self.version > VAULT_VERSION_CURRENT || self.version == 0 {
            return Err(corrupted(format!("unsupported version {}", self.version)));
        }
        if self.version == VAULT_VERSION_LEGACY {
            return Ok(());
        }

        match &self.salt {
            None => return Err(corrupted("missing salt".into())),
            Some(salt) if salt.len() != RECORD_SALT_LEN => {
                return Err(corrupted(format!(
                    "salt must be {RECORD_SALT_LEN} bytes, got {}",
                    salt.len()
                )));
            }
            Some(_) => {}
        }

        if let Some(kdf) = &self.kdf {
            check_scrypt_cost(kdf.log_n, kdf.r, kdf.p).map_err(corrupted)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// VaultRecordStore
// ---------------------------------------------------------------------------

/// Access to the singleton vault record.
pub struct VaultRecordStore<'a> {
    slot: JsonSlot<'a, VaultRecord>,
}

impl<'a> VaultRecordStore<'a> {
    /// Creates a new `VaultRecordStore`.
    pub(crate) fn new(engine: &'a StorageEngine) -> Self {
        Self {
            slot: JsonSlot::new(engine.tree(), KEY_VAULT),
        }
    }

    /// Loads the record, or `None` if no vault exists.
    pub fn load(&self) -> Result<Option<VaultRecord>> {
        self.slot.load()
    }

    /// Stores the record, replacing any previous one.
    pub fn save(&self, record: &VaultRecord) -> Result<()> {
        self.slot.store(record)
    }

    /// Deletes the record. Returns `true` if one existed.
    pub fn delete(&self) -> Result<bool> {
        self.slot.clear()
    }

    /// Returns `true` if a record is stored.
    pub fn exists(&self) -> Result<bool> {
        self.slot.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
