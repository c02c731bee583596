//! scrypt key derivation for vault encryption.
//!
//! Derives a 256-bit encryption key from a user-supplied password and a
//! salt using scrypt (memory-hard). Derivation takes hundreds of
//! milliseconds at the default cost; async callers must run it on a
//! blocking thread.

use forest_types::config::{check_scrypt_cost, VaultConfig};
use forest_types::{ForestError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed, non-secret salt used by version-1 vault records.
///
/// Shared across every installation, so it only survives to decrypt
/// legacy records before they are re-encrypted under a random salt.
pub const LEGACY_SALT: &[u8] = b"forest";

/// Byte length of a freshly generated per-vault salt.
pub const SALT_LEN: usize = 32;

// ---------------------------------------------------------------------------
// ScryptParams
// ---------------------------------------------------------------------------

/// Cost parameters for scrypt.
///
/// # Defaults
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `log_n`   | 15      | N = 32 768 iterations (32 MiB with r = 8) |
/// | `r`       | 8       | Block size |
/// | `p`       | 1       | Parallelism |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScryptParams {
    /// log2 of the CPU/memory cost N.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl ScryptParams {
    /// Builds parameters from the vault configuration.
    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            log_n: config.scrypt_log_n,
            r: config.scrypt_r,
            p: config.scrypt_p,
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// 256-bit key derived by scrypt.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Fixed byte length of the derived key.
    pub const LEN: usize = 32;

    /// Returns the raw 32-byte key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// DerivedKey does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Derives a 256-bit key from a password and salt using scrypt.
///
/// Deterministic: identical `(password, salt, params)` always yield the
/// same key.
///
/// # Errors
///
/// - [`ForestError::ConfigError`] if the parameters are out of bounds
///   (see [`check_scrypt_cost`]) or the salt is empty.
/// - [`ForestError::CryptoError`] if the derivation itself fails.
pub fn scrypt_derive_key(password: &[u8], salt: &[u8], params: &ScryptParams) -> Result<DerivedKey> {
    if salt.is_empty() {
        return Err(ForestError::ConfigError {
            reason: "scrypt salt must not be empty".into(),
        });
    }

    check_scrypt_cost(params.log_n, params.r, params.p)
        .map_err(|reason| ForestError::ConfigError { reason })?;

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, DerivedKey::LEN)
        .map_err(|e| ForestError::ConfigError {
            reason: format!("invalid scrypt parameters: {e}"),
        })?;

    let mut output = [0u8; 32];
    scrypt::scrypt(password, salt, &scrypt_params, &mut output).map_err(|e| {
        ForestError::CryptoError {
            reason: format!("scrypt derivation failed: {e}"),
        }
    })?;

    Ok(DerivedKey(output))
}

/// Generates a fresh random per-vault salt from OS entropy.
///
/// # Errors
///
/// Returns [`ForestError::CryptoError`] if the OS RNG is unavailable.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| ForestError::CryptoError {
            reason: format!("failed to generate random salt: {e}"),
        })?;
    Ok(salt)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
