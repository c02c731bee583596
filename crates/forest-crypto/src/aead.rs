//! AES-256-GCM authenticated encryption with associated data.
//!
//! The vault record is sealed with AES-256-GCM using a 96-bit (12-byte)
//! IV. IVs are generated from OS entropy per encryption and **must never
//! be reused** with the same key.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use forest_types::{ForestError, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

// ---------------------------------------------------------------------------
// AeadNonce
// ---------------------------------------------------------------------------

/// 96-bit (12-byte) initialization vector for AES-256-GCM.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AeadNonce([u8; 12]);

impl AeadNonce {
    /// Fixed byte length of an AES-GCM IV.
    pub const LEN: usize = 12;

    /// Creates an [`AeadNonce`] from raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Creates an [`AeadNonce`] from a slice, checking the length.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::AuthenticationFailure`] if the slice is not
    /// exactly 12 bytes: a malformed IV means the record was corrupted.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 12] = bytes
            .try_into()
            .map_err(|_| ForestError::AuthenticationFailure {
                reason: format!("IV must be {} bytes, got {}", Self::LEN, bytes.len()),
            })?;
        Ok(Self(arr))
    }

    /// Returns the underlying 12-byte array.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Generates a fresh 96-bit random IV from OS entropy.
///
/// # Errors
///
/// Returns [`ForestError::CryptoError`] if the OS RNG is unavailable.
pub fn generate_aead_nonce() -> Result<AeadNonce> {
    let mut bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ForestError::CryptoError {
            reason: format!("failed to generate random IV: {e}"),
        })?;
    Ok(AeadNonce(bytes))
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` with AES-256-GCM.
///
/// Returns the ciphertext with the 16-byte tag appended
/// (length = plaintext length + 16). `aad` is authenticated but not
/// encrypted; pass `&[]` if unused.
pub fn encrypt_aes256gcm(
    key: &[u8; 32],
    nonce: &AeadNonce,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| ForestError::CryptoError {
        reason: format!("invalid AES-256 key: {e}"),
    })?;
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(Nonce::from_slice(&nonce.0), payload)
        .map_err(|e| ForestError::CryptoError {
            reason: format!("AES-256-GCM encryption failed: {e}"),
        })
}

/// Decrypts `ciphertext` with AES-256-GCM.
///
/// # Errors
///
/// Returns [`ForestError::AuthenticationFailure`] if the tag check fails
/// (wrong key, wrong IV, tampered ciphertext, or wrong AAD). No
/// plaintext is ever returned in that case.
pub fn decrypt_aes256gcm(
    key: &[u8; 32],
    nonce: &AeadNonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(ForestError::AuthenticationFailure {
            reason: format!(
                "ciphertext too short: expected at least {TAG_LEN} bytes, got {}",
                ciphertext.len()
            ),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| ForestError::CryptoError {
        reason: format!("invalid AES-256 key: {e}"),
    })?;
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(Nonce::from_slice(&nonce.0), payload)
        .map_err(|_| ForestError::AuthenticationFailure {
            reason: "AES-256-GCM tag mismatch (wrong password or corrupted vault)".into(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
