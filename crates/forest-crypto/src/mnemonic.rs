//! BIP-39 mnemonic generation, validation, and seed derivation.
//!
//! Word-list handling, checksums and PBKDF2 seed stretching are delegated
//! to the `bip39` crate; this module owns the secret-hygiene wrappers
//! around them.
//!
//! 1. **Generation**: 128–256 bits of OS entropy → 12–24 English words.
//! 2. **Validation**: whitespace and case are normalised, then every word
//!    and the checksum are verified.
//! 3. **Seed derivation**: PBKDF2-HMAC-SHA512, 2048 rounds, salt
//!    `"mnemonic" + passphrase`, 64-byte output.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki>

use std::fmt;

use bip39::Language;
use forest_types::config::VALID_MNEMONIC_WORD_COUNTS;
use forest_types::{ForestError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ---------------------------------------------------------------------------
// Mnemonic
// ---------------------------------------------------------------------------

/// A validated BIP-39 mnemonic phrase.
///
/// The phrase is stored in normalised form (lowercase words joined by
/// single spaces) and zeroized on drop. `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic(String);

impl Mnemonic {
    /// Returns the mnemonic phrase as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the individual words.
    pub fn words(&self) -> Vec<&str> {
        self.0.split(' ').collect()
    }

    /// Returns the number of words in the mnemonic.
    pub fn word_count(&self) -> usize {
        self.0.split(' ').count()
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic([REDACTED; {} words])", self.word_count())
    }
}

impl PartialEq for Mnemonic {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Mnemonic {}

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// A 64-byte seed derived from a BIP-39 mnemonic.
///
/// Input to BIP-32 HD key derivation. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Fixed byte length of a BIP-39 seed.
    pub const LEN: usize = 64;

    /// Creates a [`Seed`] from a raw 64-byte array.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 64-byte seed.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// Seed does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates a new random BIP-39 mnemonic with `word_count` words.
///
/// Entropy length is `word_count / 3 * 4` bytes (12 words → 128 bits).
///
/// # Errors
///
/// - [`ForestError::ConfigError`] if `word_count` is not 12, 15, 18, 21
///   or 24.
/// - [`ForestError::CryptoError`] if the OS RNG fails.
pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic> {
    if !VALID_MNEMONIC_WORD_COUNTS.contains(&word_count) {
        return Err(ForestError::ConfigError {
            reason: format!("unsupported mnemonic length: {word_count} words"),
        });
    }

    let mut entropy = Zeroizing::new(vec![0u8; word_count / 3 * 4]);
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| ForestError::CryptoError {
            reason: format!("failed to generate mnemonic entropy: {e}"),
        })?;

    entropy_to_mnemonic(&entropy)
}

/// Converts raw entropy (16–32 bytes, multiple of 4) into a mnemonic.
///
/// Deterministic core of generation, exposed for test vectors.
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<Mnemonic> {
    let parsed = bip39::Mnemonic::from_entropy_in(Language::English, entropy).map_err(|e| {
        ForestError::CryptoError {
            reason: format!("BIP-39 encoding failed: {e}"),
        }
    })?;
    Ok(Mnemonic(parsed.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Parses and validates a user-supplied phrase.
///
/// Leading/trailing whitespace is trimmed, runs of whitespace collapse to
/// one space, and words are lowercased before the word list and checksum
/// are checked.
///
/// # Errors
///
/// Returns [`ForestError::InvalidMnemonic`] on an unknown word, a bad
/// word count, or a checksum mismatch.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let normalized = Zeroizing::new(
        phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" "),
    );

    let parsed = bip39::Mnemonic::parse_in_normalized(Language::English, &normalized).map_err(
        |e| ForestError::InvalidMnemonic {
            reason: e.to_string(),
        },
    )?;

    Ok(Mnemonic(parsed.to_string()))
}

/// Returns `Ok(())` if `phrase` is a valid BIP-39 mnemonic.
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    parse_mnemonic(phrase).map(|_| ())
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derives the 64-byte seed from a mnemonic and optional passphrase.
///
/// Use `""` for no passphrase (the wallet never sets one).
///
/// # Errors
///
/// Returns [`ForestError::InvalidMnemonic`] if the stored phrase no longer
/// parses, which only happens if the [`Mnemonic`] was built unchecked.
pub fn mnemonic_to_seed(mnemonic: &Mnemonic, passphrase: &str) -> Result<Seed> {
    let parsed = bip39::Mnemonic::parse_in_normalized(Language::English, mnemonic.as_str())
        .map_err(|e| ForestError::InvalidMnemonic {
            reason: e.to_string(),
        })?;
    Ok(Seed(parsed.to_seed_normalized(passphrase)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
