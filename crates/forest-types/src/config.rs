//! Vault configuration with sensible defaults.
//!
//! All tunable parameters of the vault core live here. Every value has
//! a documented default; [`VaultConfig::validate`] rejects values the
//! core cannot operate with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ForestError, Result};

/// Word counts accepted by BIP-39.
pub const VALID_MNEMONIC_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Upper bound on `scrypt_log_n`.
pub const MAX_SCRYPT_LOG_N: u8 = 22;

/// Upper bound on the scrypt block size `r`.
pub const MAX_SCRYPT_R: u32 = 32;

/// Upper bound on the scrypt parallelism `p`.
pub const MAX_SCRYPT_P: u32 = 16;

/// Upper bound on the scrypt working set (`128 * r * 2^log_n` bytes).
pub const MAX_SCRYPT_MEMORY_BYTES: u64 = 1 << 30;

/// Upper bound on `lock_timeout_secs` (24 hours).
pub const MAX_LOCK_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Checks scrypt cost parameters against the bounds above.
///
/// Shared by config validation and by the vault record check, since a
/// stored record's cost is untrusted input.
pub fn check_scrypt_cost(log_n: u8, r: u32, p: u32) -> std::result::Result<(), String> {
    if log_n == 0 || log_n > MAX_SCRYPT_LOG_N {
        return Err(format!("scrypt_log_n must be 1..={MAX_SCRYPT_LOG_N}, got {log_n}"));
    }
    if r == 0 || r > MAX_SCRYPT_R {
        return Err(format!("scrypt_r must be 1..={MAX_SCRYPT_R}, got {r}"));
    }
    if p == 0 || p > MAX_SCRYPT_P {
        return Err(format!("scrypt_p must be 1..={MAX_SCRYPT_P}, got {p}"));
    }
    let memory = 128 * u64::from(r) * (1u64 << log_n);
    if memory > MAX_SCRYPT_MEMORY_BYTES {
        return Err(format!(
            "scrypt cost needs {memory} bytes, limit is {MAX_SCRYPT_MEMORY_BYTES}"
        ));
    }
    Ok(())
}

/// Global vault configuration.
///
/// Loadable from a JSON file; missing fields fall back to defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// scrypt CPU/memory cost as a power of two (N = 2^log_n).
    pub scrypt_log_n: u8,

    /// scrypt block size.
    pub scrypt_r: u32,

    /// scrypt parallelism.
    pub scrypt_p: u32,

    /// Inactivity period after which the session locks, in seconds.
    pub lock_timeout_secs: u64,

    /// Whether an explicit `clear_password` notifies lock subscribers.
    ///
    /// `false` keeps manual logout silent; only automatic expiry is
    /// broadcast.
    pub notify_on_manual_lock: bool,

    /// Number of words in newly generated mnemonics.
    pub mnemonic_words: usize,

    /// Maximum number of wallets the registry will materialize.
    pub max_wallets: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            scrypt_log_n: 15,
            scrypt_r: 8,
            scrypt_p: 1,
            lock_timeout_secs: 10 * 60,
            notify_on_manual_lock: false,
            mnemonic_words: 12,
            max_wallets: 5,
        }
    }
}

impl VaultConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        check_scrypt_cost(self.scrypt_log_n, self.scrypt_r, self.scrypt_p)
            .map_err(|reason| ForestError::ConfigError { reason })?;

        if self.lock_timeout_secs == 0 || self.lock_timeout_secs > MAX_LOCK_TIMEOUT_SECS {
            return Err(ForestError::ConfigError {
                reason: format!("lock_timeout_secs must be 1..={MAX_LOCK_TIMEOUT_SECS}"),
            });
        }

        if !VALID_MNEMONIC_WORD_COUNTS.contains(&self.mnemonic_words) {
            return Err(ForestError::ConfigError {
                reason: format!(
                    "mnemonic_words must be one of {VALID_MNEMONIC_WORD_COUNTS:?}, got {}",
                    self.mnemonic_words
                ),
            });
        }

        if self.max_wallets == 0 {
            return Err(ForestError::ConfigError {
                reason: "max_wallets must be greater than 0".into(),
            });
        }

        Ok(())
    }

    /// Returns the inactivity timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(VaultConfig::default().validate().is_ok());
    }

    #[test]
    fn default_values() {
        let config = VaultConfig::default();
        assert_eq!(config.scrypt_log_n, 15);
        assert_eq!(config.scrypt_r, 8);
        assert_eq!(config.scrypt_p, 1);
        assert_eq!(config.lock_timeout_secs, 600);
        assert!(!config.notify_on_manual_lock);
        assert_eq!(config.mnemonic_words, 12);
        assert_eq!(config.max_wallets, 5);
        assert_eq!(config.lock_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn zero_log_n_rejected() {
        let config = VaultConfig {
            scrypt_log_n: 0,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_log_n_rejected() {
        let config = VaultConfig {
            scrypt_log_n: MAX_SCRYPT_LOG_N + 1,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_r_and_p_rejected() {
        let zero_r = VaultConfig {
            scrypt_r: 0,
            ..VaultConfig::default()
        };
        let zero_p = VaultConfig {
            scrypt_p: 0,
            ..VaultConfig::default()
        };
        assert!(zero_r.validate().is_err());
        assert!(zero_p.validate().is_err());
    }

    #[test]
    fn oversized_r_p_and_memory_rejected() {
        assert!(check_scrypt_cost(15, MAX_SCRYPT_R + 1, 1).is_err());
        assert!(check_scrypt_cost(15, 8, MAX_SCRYPT_P + 1).is_err());
        // 128 * 8 * 2^21 = 2 GiB.
        assert!(check_scrypt_cost(21, 8, 1).is_err());
        assert!(check_scrypt_cost(20, 8, 1).is_ok());
        assert!(check_scrypt_cost(50, 8, 1).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = VaultConfig {
            lock_timeout_secs: 0,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unbounded_timeout_rejected() {
        let config = VaultConfig {
            lock_timeout_secs: u64::MAX,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());

        let max = VaultConfig {
            lock_timeout_secs: MAX_LOCK_TIMEOUT_SECS,
            ..VaultConfig::default()
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn odd_word_count_rejected() {
        let config = VaultConfig {
            mnemonic_words: 13,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_wallets_rejected() {
        let config = VaultConfig {
            max_wallets: 0,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let parsed: VaultConfig = serde_json::from_str(r#"{ "lock_timeout_secs": 120 }"#)?;
        assert_eq!(parsed.lock_timeout_secs, 120);
        assert_eq!(parsed.scrypt_log_n, 15);
        assert_eq!(parsed.mnemonic_words, 12);
        Ok(())
    }
}
