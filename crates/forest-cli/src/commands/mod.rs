//! Command handlers.
//!
//! Every handler opens the vault from the resolved config, does its
//! work, and prints through [`crate::output`]. Errors are returned as
//! display strings.

pub mod derive;
pub mod vault;
pub mod wallets;

use std::io::{BufRead, Write};
use std::sync::Arc;

use forest_storage::StorageEngine;
use forest_vault::Vault;
use zeroize::Zeroizing;

use crate::GlobalOpts;

/// Environment variable read before prompting for the password.
pub const PASSWORD_ENV: &str = "FOREST_PASSWORD";

/// Environment variable read before prompting for a recovery phrase.
pub const MNEMONIC_ENV: &str = "FOREST_MNEMONIC";

/// Opens storage under the configured data directory and wraps it in a
/// [`Vault`].
pub fn open_vault(opts: &GlobalOpts) -> Result<Vault, String> {
    let dir = &opts.config.data_dir;
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("failed to create data directory {}: {e}", dir.display()))?;
    let engine = StorageEngine::open(&dir.join("vault.db")).map_err(|e| e.to_string())?;
    Vault::new(Arc::new(engine), opts.config.vault.clone()).map_err(|e| e.to_string())
}

/// Reads the vault password from `FOREST_PASSWORD`, or prompts on the
/// terminal without echo.
///
/// The password is used exactly as given on either path; surrounding
/// whitespace is significant.
pub fn read_password(prompt: &str) -> Result<Zeroizing<String>, String> {
    if let Ok(pass) = std::env::var(PASSWORD_ENV) {
        return Ok(Zeroizing::new(pass));
    }
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .map_err(|e| format!("failed to read password: {e}"))
}

/// Reads a recovery phrase from `FOREST_MNEMONIC`, or prompts on stderr.
///
/// Whitespace is irrelevant here; the phrase is normalised on parse.
pub fn read_phrase(prompt: &str) -> Result<Zeroizing<String>, String> {
    if let Ok(phrase) = std::env::var(MNEMONIC_ENV) {
        return Ok(Zeroizing::new(phrase));
    }
    prompt_line(prompt)
}

fn prompt_line(prompt: &str) -> Result<Zeroizing<String>, String> {
    eprint!("{prompt}");
    std::io::stderr()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;

    let mut input = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| format!("failed to read input: {e}"))?;
    Ok(Zeroizing::new(input.trim().to_string()))
}
