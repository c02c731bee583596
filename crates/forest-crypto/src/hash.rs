//! Keccak-256 hashing.
//!
//! Ethereum uses the original Keccak padding, not NIST SHA3-256; the two
//! produce different digests for the same input.

use tiny_keccak::{Hasher, Keccak};

/// Computes the Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn keccak256_is_deterministic() {
        assert_eq!(keccak256(b"forest"), keccak256(b"forest"));
        assert_ne!(keccak256(b"forest"), keccak256(b"Forest"));
    }
}
