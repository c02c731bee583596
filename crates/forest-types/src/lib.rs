//! Core shared types for the Forest vault core.
//!
//! This crate defines the fundamental types used across the workspace:
//! the EVM [`Address`], session status and lock events, and the single
//! [`ForestError`] enum every other crate converts its failures into.

pub mod config;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 20-byte Ethereum-compatible account address.
///
/// The last 20 bytes of `Keccak-256(uncompressed_pubkey[1..])`. `Display`
/// renders the lowercase `0x`-prefixed form; the EIP-55 checksummed form
/// is produced by `forest_crypto::address::to_checksum_address`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The fixed byte length of an address.
    pub const LEN: usize = 20;

    /// Creates a new `Address` from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ForestError;

    /// Parses a hex address with or without the `0x` prefix.
    ///
    /// Case is ignored; checksum validation is the caller's concern.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|_| ForestError::ConfigError {
            reason: format!("invalid hex encoding in address '{trimmed}'"),
        })?;
        if bytes.len() != Self::LEN {
            return Err(ForestError::ConfigError {
                reason: format!("address must be {} bytes, got {}", Self::LEN, bytes.len()),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// UTC wall-clock timestamp attached to lock events.
///
/// Session deadlines are computed on a monotonic clock; this type only
/// records *when* something happened for display and logging.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lock state of the in-memory session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No password is cached; secret access requires a fresh unlock.
    Locked,
    /// A password is cached and the inactivity timer is armed.
    Unlocked,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
        }
    }
}

// ---------------------------------------------------------------------------
// LockEvent
// ---------------------------------------------------------------------------

/// Why a session transitioned to [`SessionStatus::Locked`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LockReason {
    /// The inactivity timeout elapsed with no intervening activity.
    Expired,
    /// The session was cleared explicitly (logout).
    Manual,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Notification broadcast to lock subscribers.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LockEvent {
    /// What caused the lock.
    pub reason: LockReason,
    /// When the session locked.
    pub locked_at: Timestamp,
}

impl LockEvent {
    /// Creates an event stamped with the current time.
    pub fn now(reason: LockReason) -> Self {
        Self {
            reason,
            locked_at: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ForestError
// ---------------------------------------------------------------------------

/// Central error type for the Forest vault core.
///
/// All crates in the workspace convert their internal errors into variants
/// of this enum. None of them are retried automatically; re-prompting is
/// the caller's decision.
#[derive(Debug, Error)]
pub enum ForestError {
    /// No vault record has been created yet.
    #[error("vault not found")]
    VaultNotFound,

    /// Wrong password, or the stored ciphertext was corrupted or tampered
    /// with (AEAD tag mismatch).
    #[error("authentication failure: {reason}")]
    AuthenticationFailure {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A storage or (de)serialization operation failed.
    #[error("storage error: {reason}")]
    StorageError {
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// Secret access was attempted with no active session.
    #[error("session is locked")]
    SessionLocked,

    /// A cryptographic operation failed (RNG, key derivation, encryption).
    #[error("crypto error: {reason}")]
    CryptoError {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// A seed phrase failed BIP-39 validation.
    #[error("invalid mnemonic: {reason}")]
    InvalidMnemonic {
        /// Human-readable description of the validation failure.
        reason: String,
    },

    /// No wallet metadata exists for the given id.
    #[error("wallet not found: {id}")]
    WalletNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A configuration value or parameter is invalid.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`ForestError`].
pub type Result<T> = std::result::Result<T, ForestError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
