//! Cryptographic primitives for the Forest vault core.
//!
//! This crate is the **sole** location for raw cryptographic operations.
//! The vault and session layers compose these functions; they never call
//! cipher or hash crates directly.
//!
//! # Modules
//!
//! - [`kdf`]: scrypt password → key derivation
//! - [`aead`]: AES-256-GCM authenticated encryption/decryption
//! - [`mnemonic`]: BIP-39 generation, validation and seed derivation
//! - [`hd_derive`]: BIP-32/44 secp256k1 derivation along `m/44'/60'/0'/0/i`
//! - [`hash`]: Keccak-256
//! - [`address`]: EVM address derivation and EIP-55 checksums

pub mod address;
pub mod aead;
pub mod hash;
pub mod hd_derive;
pub mod kdf;
pub mod mnemonic;
