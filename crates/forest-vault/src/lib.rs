//! Vault and session security core for the Forest wallet.
//!
//! - [`vault`]: password-sealed mnemonic: create, import, unlock, wipe
//! - [`account`]: HD account derivation at `m/44'/60'/0'/0/i`
//! - [`registry`]: persisted list of materialized wallets
//! - [`session`]: in-memory password cache with inactivity auto-lock
//!
//! # Typical flow
//!
//! ```text
//! Vault::unlock_session(pw, &session) ─▶ Mnemonic ─▶ derive_account(i)
//!            │                                          │
//!            ▼                                          ▼
//!   SessionCache (timer) ◀── get_password ──   WalletRegistry
//! ```

pub mod account;
pub mod registry;
pub mod session;
pub mod vault;

pub use account::{derive_account, derive_accounts, Account};
pub use registry::WalletRegistry;
pub use session::{SessionCache, SessionConfig};
pub use vault::{CreatedVault, ImportedVault, Vault};
