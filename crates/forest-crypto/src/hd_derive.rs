//! BIP-32 secp256k1 hierarchical deterministic key derivation.
//!
//! Derives Ethereum-compatible private keys from a BIP-39 seed along
//! BIP-44 paths. Account `i` lives at:
//!
//! ```text
//! m/44'/60'/0'/0/i
//! ```
//!
//! The first three levels are hardened; the change and address levels are
//! not, so `i` must be below 2^31.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use std::ops::Range;
use std::str::FromStr;

use bip32::{ChildNumber, DerivationPath, XPrv};
use forest_types::{ForestError, Result};
use zeroize::Zeroizing;

use crate::mnemonic::Seed;

/// SLIP-0044 coin type for Ethereum and EVM chains.
pub const ETH_COIN_TYPE: u32 = 60;

/// Parent path of every external EVM account (`m/44'/60'/0'/0`).
pub const EVM_BASE_PATH: &str = "m/44'/60'/0'/0";

/// First index that would be interpreted as hardened.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Returns the full derivation path of EVM account `index`.
pub fn evm_path(index: u32) -> String {
    format!("{EVM_BASE_PATH}/{index}")
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derives a single 32-byte secp256k1 private key at `path`.
///
/// # Errors
///
/// - [`ForestError::ConfigError`] if the path does not parse.
/// - [`ForestError::CryptoError`] if master key or child derivation
///   fails (negligible probability for valid input).
pub fn derive_secp256k1_key(seed: &Seed, path: &str) -> Result<Zeroizing<[u8; 32]>> {
    let derivation_path = parse_path(path)?;
    let xprv = derive_xprv(seed, &derivation_path)?;
    Ok(private_key_bytes(&xprv))
}

/// Derives the private key of EVM account `index` (`m/44'/60'/0'/0/index`).
pub fn derive_evm_key(seed: &Seed, index: u32) -> Result<Zeroizing<[u8; 32]>> {
    check_index(index)?;
    derive_secp256k1_key(seed, &evm_path(index))
}

/// Derives private keys for a contiguous range of EVM account indices.
///
/// The master → `m/44'/60'/0'/0` prefix is computed once and fanned out,
/// so this is cheaper than calling [`derive_evm_key`] per index. Results
/// are identical to the single-key path.
pub fn derive_evm_keys(seed: &Seed, indices: Range<u32>) -> Result<Vec<Zeroizing<[u8; 32]>>> {
    if indices.end > HARDENED_OFFSET {
        return Err(ForestError::ConfigError {
            reason: format!("account index range {indices:?} exceeds {}", HARDENED_OFFSET - 1),
        });
    }

    let base = derive_xprv(seed, &parse_path(EVM_BASE_PATH)?)?;

    let mut keys = Vec::with_capacity(indices.len());
    for index in indices {
        let child_number = ChildNumber::new(index, false).map_err(|e| ForestError::ConfigError {
            reason: format!("invalid account index {index}: {e}"),
        })?;
        let child = base
            .derive_child(child_number)
            .map_err(|e| ForestError::CryptoError {
                reason: format!("child derivation failed at index {index}: {e}"),
            })?;
        keys.push(private_key_bytes(&child));
    }

    Ok(keys)
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn check_index(index: u32) -> Result<()> {
    if index >= HARDENED_OFFSET {
        return Err(ForestError::ConfigError {
            reason: format!("account index {index} exceeds {}", HARDENED_OFFSET - 1),
        });
    }
    Ok(())
}

fn parse_path(path: &str) -> Result<DerivationPath> {
    DerivationPath::from_str(path.trim()).map_err(|e| ForestError::ConfigError {
        reason: format!("invalid derivation path '{path}': {e}"),
    })
}

/// Walks `path` from the master key, one child at a time.
fn derive_xprv(seed: &Seed, path: &DerivationPath) -> Result<XPrv> {
    let mut xprv = XPrv::new(seed.as_bytes()).map_err(|e| ForestError::CryptoError {
        reason: format!("failed to create master key: {e}"),
    })?;

    for child_number in path.iter() {
        xprv = xprv
            .derive_child(child_number)
            .map_err(|e| ForestError::CryptoError {
                reason: format!("child derivation failed: {e}"),
            })?;
    }

    Ok(xprv)
}

fn private_key_bytes(xprv: &XPrv) -> Zeroizing<[u8; 32]> {
    let bytes: [u8; 32] = xprv.private_key().to_bytes().into();
    Zeroizing::new(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seed() -> Seed {
        Seed::from_bytes([0x42; 64])
    }

    #[test]
    fn evm_path_format() {
        assert_eq!(evm_path(0), "m/44'/60'/0'/0/0");
        assert_eq!(evm_path(17), "m/44'/60'/0'/0/17");
    }

    #[test]
    fn derivation_is_deterministic() -> std::result::Result<(), ForestError> {
        let k1 = derive_evm_key(&test_seed(), 0)?;
        let k2 = derive_evm_key(&test_seed(), 0)?;
        assert_eq!(*k1, *k2);
        Ok(())
    }

    #[test]
    fn different_indices_different_keys() -> std::result::Result<(), ForestError> {
        let k0 = derive_evm_key(&test_seed(), 0)?;
        let k1 = derive_evm_key(&test_seed(), 1)?;
        assert_ne!(*k0, *k1);
        Ok(())
    }

    #[test]
    fn batch_matches_single() -> std::result::Result<(), ForestError> {
        let batch = derive_evm_keys(&test_seed(), 0..4)?;
        assert_eq!(batch.len(), 4);
        for (i, key) in batch.iter().enumerate() {
            let single = derive_evm_key(&test_seed(), i as u32)?;
            assert_eq!(**key, *single, "batch[{i}] differs from single derivation");
        }
        Ok(())
    }

    #[test]
    fn hardened_range_index_rejected() {
        assert!(derive_evm_key(&test_seed(), HARDENED_OFFSET).is_err());
        assert!(derive_evm_keys(&test_seed(), 0..HARDENED_OFFSET + 1).is_err());
    }

    #[test]
    fn malformed_path_rejected() {
        assert!(derive_secp256k1_key(&test_seed(), "44'/60'").is_err());
        assert!(derive_secp256k1_key(&test_seed(), "m/44'/x").is_err());
    }

    #[test]
    fn explicit_path_matches_evm_helper() -> std::result::Result<(), ForestError> {
        let explicit = derive_secp256k1_key(&test_seed(), "m/44'/60'/0'/0/3")?;
        let helper = derive_evm_key(&test_seed(), 3)?;
        assert_eq!(*explicit, *helper);
        Ok(())
    }
}
