//! Password-protected vault holding the wallet mnemonic.
//!
//! The mnemonic is sealed with AES-256-GCM under a key derived from the
//! user password by scrypt. Only the sealed record reaches storage; the
//! plaintext phrase exists only in memory after a successful unlock.
//!
//! # Record versions
//!
//! - **v2**: random 32-byte salt per vault, scrypt cost stored in the
//!   record. The AAD covers a format tag, the version, the salt and the
//!   cost, so none of them can be edited without failing the tag check.
//! - **v1** (legacy): fixed salt `"forest"`, fixed cost N = 2^15, no
//!   AAD. Opened for compatibility and re-sealed as v2 on the next
//!   successful unlock.

use std::sync::Arc;

use forest_crypto::aead::{
    decrypt_aes256gcm, encrypt_aes256gcm, generate_aead_nonce, AeadNonce,
};
use forest_crypto::kdf::{generate_salt, scrypt_derive_key, ScryptParams, LEGACY_SALT};
use forest_crypto::mnemonic::{generate_mnemonic, parse_mnemonic, Mnemonic};
use forest_storage::vault_record::VAULT_VERSION_CURRENT;
use forest_storage::{StorageEngine, StoredKdfParams, StoredWalletMetadata, VaultRecord};
use forest_types::config::VaultConfig;
use forest_types::{ForestError, Result};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use crate::account::derive_account;
use crate::registry::WalletRegistry;
use crate::session::SessionCache;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format tag at the start of the associated data of v2 records.
pub(crate) const VAULT_AAD: &[u8] = b"forest-vault-v2";

/// Derivation index of the default wallet, whose address
/// `create_vault`/`import_vault` report.
const DEFAULT_WALLET_INDEX: u32 = 0;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of [`Vault::create_vault`].
///
/// The mnemonic is returned once so the caller can show it to the user;
/// it is zeroized when this value is dropped.
#[derive(Debug)]
pub struct CreatedVault {
    /// EIP-55 address of account 0.
    pub address: String,
    /// Freshly generated recovery phrase.
    pub mnemonic: Mnemonic,
}

/// Outcome of [`Vault::import_vault`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedVault {
    /// EIP-55 address of account 0.
    pub address: String,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// The vault: one sealed mnemonic per storage engine.
///
/// Create, import, unlock and wipe are serialized by an internal async
/// mutex, so concurrent callers never interleave a read of the record
/// with a replacement of it.
pub struct Vault {
    engine: Arc<StorageEngine>,
    registry: Arc<WalletRegistry>,
    config: VaultConfig,
    op_lock: Mutex<()>,
}

impl Vault {
    /// Creates a vault over `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::ConfigError`] if `config` fails validation.
    pub fn new(engine: Arc<StorageEngine>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(WalletRegistry::new(Arc::clone(&engine))),
            engine,
            config,
            op_lock: Mutex::new(()),
        })
    }

    // -- Accessors --------------------------------------------------------

    /// Returns the wallet registry backed by the same storage.
    pub fn registry(&self) -> Arc<WalletRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Returns `true` if a vault record exists.
    pub fn has_vault(&self) -> Result<bool> {
        self.engine.vault_records().exists()
    }

    // -- Lifecycle --------------------------------------------------------

    /// Seals `phrase` under `password` and stores it, replacing any
    /// existing vault.
    ///
    /// A fresh salt and IV are generated on every call.
    ///
    /// # Errors
    ///
    /// - [`ForestError::InvalidMnemonic`] if `phrase` is not valid BIP-39.
    /// - [`ForestError::StorageError`] if persisting fails.
    pub async fn store_mnemonic(&self, password: &str, phrase: &str) -> Result<()> {
        let mnemonic = parse_mnemonic(phrase)?;
        let _guard = self.op_lock.lock().await;
        self.seal_and_store(password, mnemonic).await?;
        Ok(())
    }

    /// Generates a new mnemonic, seals it, and returns it with the
    /// address of account 0.
    pub async fn create_vault(&self, password: &str) -> Result<CreatedVault> {
        let mnemonic = generate_mnemonic(self.config.mnemonic_words)?;
        let _guard = self.op_lock.lock().await;
        let mnemonic = self.seal_and_store(password, mnemonic).await?;
        let address = derive_account(&mnemonic, 0)?.address();

        tracing::info!(%address, "vault created");
        Ok(CreatedVault { address, mnemonic })
    }

    /// Validates a user-supplied phrase, seals it, and returns the
    /// address of account 0.
    pub async fn import_vault(&self, password: &str, phrase: &str) -> Result<ImportedVault> {
        let mnemonic = parse_mnemonic(phrase)?;
        let _guard = self.op_lock.lock().await;
        let mnemonic = self.seal_and_store(password, mnemonic).await?;
        let address = derive_account(&mnemonic, 0)?.address();

        tracing::info!(%address, "vault imported");
        Ok(ImportedVault { address })
    }

    /// Decrypts and returns the mnemonic.
    ///
    /// Legacy records are re-sealed in the current format after a
    /// successful decrypt.
    ///
    /// # Errors
    ///
    /// - [`ForestError::VaultNotFound`] if no vault exists.
    /// - [`ForestError::AuthenticationFailure`] on a wrong password or a
    ///   tampered record. No partial plaintext is ever returned.
    pub async fn unlock_vault(&self, password: &str) -> Result<Mnemonic> {
        let _guard = self.op_lock.lock().await;
        self.unlock_locked(password).await
    }

    /// Irreversibly deletes the vault record, the wallet list and the
    /// derivation counter.
    pub async fn wipe_vault(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let removed = self.engine.wipe()?;
        tracing::warn!(records = removed, "vault wiped");
        Ok(())
    }

    // -- Wallets ----------------------------------------------------------

    /// Registers the index-0 wallet as "Wallet 1" if no wallet is saved.
    ///
    /// Account 0 is the vault's primary address, so it is registered
    /// again even if an earlier index-0 wallet was removed. Every other
    /// index comes from the monotonic counter.
    ///
    /// Returns the wallet list after the call.
    pub async fn ensure_default_wallet(&self, password: &str) -> Result<Vec<StoredWalletMetadata>> {
        let _guard = self.op_lock.lock().await;
        let wallets = self.registry.list_wallets()?;
        if !wallets.is_empty() {
            return Ok(wallets);
        }

        let mnemonic = self.unlock_locked(password).await?;
        let account = derive_account(&mnemonic, DEFAULT_WALLET_INDEX)?;
        self.registry
            .register_account(&default_wallet_name(DEFAULT_WALLET_INDEX), &account)?;
        self.registry.list_wallets()
    }

    /// Unlocks the vault, reserves the next derivation index, derives
    /// that account and saves it as a new wallet.
    ///
    /// `name` defaults to `"Wallet N"` with N = derivation index + 1.
    /// The limit check and the registration run under the vault lock,
    /// so concurrent callers cannot overshoot `max_wallets`.
    ///
    /// # Errors
    ///
    /// - [`ForestError::ConfigError`] if `max_wallets` is reached.
    /// - Any error of [`unlock_vault`](Self::unlock_vault).
    pub async fn create_additional_wallet(
        &self,
        password: &str,
        name: Option<&str>,
    ) -> Result<StoredWalletMetadata> {
        let _guard = self.op_lock.lock().await;
        let existing = self.registry.list_wallets()?.len();
        if existing >= self.config.max_wallets {
            return Err(ForestError::ConfigError {
                reason: format!("maximum of {} wallets reached", self.config.max_wallets),
            });
        }

        let mnemonic = self.unlock_locked(password).await?;
        let index = self.registry.next_derivation_index()?;
        let account = derive_account(&mnemonic, index)?;

        let name = match name {
            Some(name) => name.to_string(),
            None => default_wallet_name(index),
        };
        self.registry.register_account(&name, &account)
    }

    // -- Session ----------------------------------------------------------

    /// Unlocks the vault and, on success, caches `password` in `session`.
    pub async fn unlock_session(&self, password: &str, session: &SessionCache) -> Result<Mnemonic> {
        let mnemonic = self.unlock_vault(password).await?;
        session.set_password(password);
        Ok(mnemonic)
    }

    /// Unlocks the vault with the password cached in `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::SessionLocked`] if the session holds no
    /// password.
    pub async fn unlock_from_session(&self, session: &SessionCache) -> Result<Mnemonic> {
        let password = session.get_password().ok_or(ForestError::SessionLocked)?;
        self.unlock_vault(&password).await
    }

    // -- Internal ---------------------------------------------------------

    /// Seals `mnemonic` as a current-format record and persists it.
    ///
    /// Caller must hold `op_lock`. Returns the mnemonic back.
    async fn seal_and_store(&self, password: &str, mnemonic: Mnemonic) -> Result<Mnemonic> {
        let params = ScryptParams::from_config(&self.config);
        let password = Zeroizing::new(password.to_string());

        let (record, mnemonic) = run_blocking(move || {
            let record = seal_record(&password, &mnemonic, &params)?;
            Ok((record, mnemonic))
        })
        .await?;

        self.engine.vault_records().save(&record)?;
        self.engine.flush()?;
        Ok(mnemonic)
    }

    /// Unlock body; caller must hold `op_lock`.
    async fn unlock_locked(&self, password: &str) -> Result<Mnemonic> {
        let record = self
            .engine
            .vault_records()
            .load()?
            .ok_or(ForestError::VaultNotFound)?;
        record.validate()?;

        let legacy = record.is_legacy();
        let owned_password = Zeroizing::new(password.to_string());

        let opened = run_blocking(move || open_record(&owned_password, &record)).await;
        let mnemonic = match opened {
            Ok(mnemonic) => mnemonic,
            Err(e) => {
                if matches!(e, ForestError::AuthenticationFailure { .. }) {
                    tracing::warn!("vault unlock rejected");
                }
                return Err(e);
            }
        };

        if legacy {
            let mnemonic = self.seal_and_store(password, mnemonic).await?;
            tracing::info!("legacy vault record migrated to per-vault salt");
            return Ok(mnemonic);
        }

        tracing::debug!("vault unlocked");
        Ok(mnemonic)
    }
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Seals `mnemonic` into a v2 record with a fresh salt and IV.
pub(crate) fn seal_record(
    password: &str,
    mnemonic: &Mnemonic,
    params: &ScryptParams,
) -> Result<VaultRecord> {
    let salt = generate_salt()?;
    let kdf = StoredKdfParams {
        log_n: params.log_n,
        r: params.r,
        p: params.p,
    };
    let key = scrypt_derive_key(password.as_bytes(), &salt, params)?;
    let iv = generate_aead_nonce()?;
    let aad = record_aad(VAULT_VERSION_CURRENT, &salt, Some(&kdf));
    let enc = encrypt_aes256gcm(key.as_bytes(), &iv, mnemonic.as_str().as_bytes(), &aad)?;

    Ok(VaultRecord {
        version: VAULT_VERSION_CURRENT,
        enc,
        iv: iv.as_bytes().to_vec(),
        salt: Some(salt.to_vec()),
        kdf: Some(kdf),
    })
}

/// Opens a record of either version.
///
/// Legacy records use the fixed salt and cost with empty AAD. A current
/// record without stored cost falls back to the default cost; its AAD
/// still records the absence, so stripping `kdf` fails authentication.
pub(crate) fn open_record(password: &str, record: &VaultRecord) -> Result<Mnemonic> {
    record.validate()?;
    let iv = AeadNonce::from_slice(&record.iv)?;

    let (salt, params, aad): (&[u8], ScryptParams, Vec<u8>) = match &record.salt {
        Some(salt) if !record.is_legacy() => {
            let params = record
                .kdf
                .map(|kdf| ScryptParams {
                    log_n: kdf.log_n,
                    r: kdf.r,
                    p: kdf.p,
                })
                .unwrap_or_default();
            let aad = record_aad(record.version, salt, record.kdf.as_ref());
            (salt.as_slice(), params, aad)
        }
        _ => (LEGACY_SALT, ScryptParams::default(), Vec::new()),
    };

    let key = scrypt_derive_key(password.as_bytes(), salt, &params)?;
    let plaintext = Zeroizing::new(decrypt_aes256gcm(key.as_bytes(), &iv, &record.enc, &aad)?);

    let phrase = std::str::from_utf8(&plaintext).map_err(|_| ForestError::AuthenticationFailure {
        reason: "decrypted vault is not valid UTF-8".into(),
    })?;
    parse_mnemonic(phrase)
}

/// Associated data of a v2 record: format tag, version, salt, then the
/// cost (`0` if absent, `1 || log_n || r || p` otherwise).
///
/// The salt has a fixed length once validated, so the encoding is
/// unambiguous.
fn record_aad(version: u32, salt: &[u8], kdf: Option<&StoredKdfParams>) -> Vec<u8> {
    let mut aad = Vec::with_capacity(VAULT_AAD.len() + 4 + salt.len() + 10);
    aad.extend_from_slice(VAULT_AAD);
    aad.extend_from_slice(&version.to_be_bytes());
    aad.extend_from_slice(salt);
    match kdf {
        Some(kdf) => {
            aad.push(1);
            aad.push(kdf.log_n);
            aad.extend_from_slice(&kdf.r.to_be_bytes());
            aad.extend_from_slice(&kdf.p.to_be_bytes());
        }
        None => aad.push(0),
    }
    aad
}

fn default_wallet_name(index: u32) -> String {
    format!("Wallet {}", u64::from(index) + 1)
}

/// Runs CPU-heavy KDF/AEAD work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ForestError::CryptoError {
            reason: format!("vault crypto task failed: {e}"),
        })?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
