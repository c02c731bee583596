//! HD account derivation from a mnemonic.
//!
//! Account `i` is the secp256k1 key at `m/44'/60'/0'/0/i` and the EVM
//! address it controls. Derivation is pure: no state, safe to call from
//! any thread, same output for the same `(mnemonic, index)`.

use std::fmt;
use std::ops::Range;

use forest_crypto::address::{address_from_private_key, to_checksum_address};
use forest_crypto::hd_derive::{derive_evm_key, derive_evm_keys, evm_path};
use forest_crypto::mnemonic::{mnemonic_to_seed, Mnemonic};
use forest_types::{Address, Result};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One derived HD account. The private key is zeroized on drop.
pub struct Account {
    index: u32,
    address: Address,
    private_key: Zeroizing<[u8; 32]>,
}

impl Account {
    fn from_key(index: u32, private_key: Zeroizing<[u8; 32]>) -> Result<Self> {
        let address = address_from_private_key(&private_key)?;
        Ok(Self {
            index,
            address,
            private_key,
        })
    }

    /// Returns the BIP-44 address index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the EIP-55 checksummed `0x…` address.
    pub fn address(&self) -> String {
        to_checksum_address(&self.address)
    }

    /// Returns the raw 20-byte address.
    pub fn raw_address(&self) -> &Address {
        &self.address
    }

    /// Returns the full derivation path of this account.
    pub fn path(&self) -> String {
        evm_path(self.index)
    }

    /// Returns the 32-byte secp256k1 private key.
    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("address", &self.address())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

// Account does not implement Clone to prevent key copies.

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derives account `index` from `mnemonic`.
///
/// # Errors
///
/// - [`ForestError::ConfigError`](forest_types::ForestError::ConfigError)
///   if `index >= 2^31`.
/// - [`ForestError::CryptoError`](forest_types::ForestError::CryptoError)
///   if derivation fails.
pub fn derive_account(mnemonic: &Mnemonic, index: u32) -> Result<Account> {
    let seed = mnemonic_to_seed(mnemonic, "")?;
    let key = derive_evm_key(&seed, index)?;
    Account::from_key(index, key)
}

/// Derives every account in `indices`.
///
/// The seed and the `m/44'/60'/0'/0` parent are computed once.
pub fn derive_accounts(mnemonic: &Mnemonic, indices: Range<u32>) -> Result<Vec<Account>> {
    let seed = mnemonic_to_seed(mnemonic, "")?;
    let start = indices.start;
    derive_evm_keys(&seed, indices)?
        .into_iter()
        .zip(start..)
        .map(|(key, index)| Account::from_key(index, key))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
