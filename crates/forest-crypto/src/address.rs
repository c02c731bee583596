//! EVM address derivation and EIP-55 checksum encoding.
//!
//! ```text
//! private key (32B) → secp256k1 public key (65B, uncompressed)
//!                   → drop 0x04 prefix (64B)
//!                   → keccak256 → last 20 bytes
//! ```

use forest_types::{Address, ForestError, Result};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use zeroize::Zeroize;

use crate::hash::keccak256;

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derives the 20-byte EVM address controlled by `private_key`.
///
/// # Errors
///
/// Returns [`ForestError::CryptoError`] if `private_key` is zero or not
/// below the curve order.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<Address> {
    let secret = SecretKey::from_slice(private_key).map_err(|e| ForestError::CryptoError {
        reason: format!("invalid secp256k1 private key: {e}"),
    })?;

    let encoded = secret.public_key().to_encoded_point(false);
    let mut hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    hash.zeroize();

    Ok(Address::new(address))
}

// ---------------------------------------------------------------------------
// EIP-55
// ---------------------------------------------------------------------------

/// Encodes `address` as a `0x`-prefixed EIP-55 mixed-case checksum string.
///
/// A hex letter is uppercased when the matching nibble of
/// `keccak256(lowercase_hex)` is 8 or above.
pub fn to_checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns `true` if `s` is a checksummed address whose casing matches
/// EIP-55. All-lowercase or all-uppercase input carries no checksum and
/// is accepted.
pub fn is_valid_checksum_address(s: &str) -> bool {
    let Ok(address) = s.parse::<Address>() else {
        return false;
    };
    let body = s.strip_prefix("0x").unwrap_or(s);
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(&address)[2..] == *body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// First account of "abandon … about" at m/44'/60'/0'/0/0.
    const ABANDON_KEY: &str = "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727";
    const ABANDON_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

    fn key_from_hex(s: &str) -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&hex::decode(s).expect("valid hex"));
        key
    }

    #[test]
    fn known_private_key_maps_to_known_address() -> std::result::Result<(), ForestError> {
        let address = address_from_private_key(&key_from_hex(ABANDON_KEY))?;
        assert_eq!(to_checksum_address(&address), ABANDON_ADDRESS);
        Ok(())
    }

    #[test]
    fn zero_key_rejected() {
        assert!(matches!(
            address_from_private_key(&[0u8; 32]),
            Err(ForestError::CryptoError { .. })
        ));
    }

    /// Vectors from EIP-55.
    #[test]
    fn eip55_vectors() -> std::result::Result<(), ForestError> {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let address: Address = expected.to_lowercase().parse()?;
            assert_eq!(to_checksum_address(&address), expected);
        }
        Ok(())
    }

    #[test]
    fn checksum_validation() {
        assert!(is_valid_checksum_address(ABANDON_ADDRESS));
        assert!(is_valid_checksum_address(&ABANDON_ADDRESS.to_lowercase()));
        assert!(!is_valid_checksum_address("0x9858efFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!is_valid_checksum_address("0x1234"));
    }
}
