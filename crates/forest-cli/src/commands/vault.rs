//! Vault lifecycle commands: create, import, unlock, status, wipe.

use colored::Colorize;
use forest_vault::Vault;

use crate::commands::{open_vault, read_password, read_phrase};
use crate::output;
use crate::GlobalOpts;

/// Generates a new vault and prints the recovery phrase once.
pub async fn create(force: bool, opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    clear_existing(&vault, force, opts.json).await?;

    let password = read_password("New vault password: ")?;
    let created = vault
        .create_vault(&password)
        .await
        .map_err(|e| e.to_string())?;
    vault
        .ensure_default_wallet(&password)
        .await
        .map_err(|e| e.to_string())?;

    if opts.json {
        let obj = serde_json::json!({
            "address": created.address,
            "mnemonic": created.mnemonic.as_str(),
        });
        println!("{obj}");
    } else {
        output::print_success("vault created", false);
        output::print_kv("Address", &created.address, false);
        println!();
        println!("{}", "Recovery phrase (shown once, write it down):".yellow().bold());
        for (i, word) in created.mnemonic.words().iter().enumerate() {
            println!("  {:>2}. {word}", i + 1);
        }
    }
    Ok(())
}

/// Imports an existing recovery phrase.
pub async fn import(force: bool, opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    clear_existing(&vault, force, opts.json).await?;

    let phrase = read_phrase("Recovery phrase: ")?;
    let password = read_password("New vault password: ")?;
    let imported = vault
        .import_vault(&password, &phrase)
        .await
        .map_err(|e| e.to_string())?;
    vault
        .ensure_default_wallet(&password)
        .await
        .map_err(|e| e.to_string())?;

    if opts.json {
        output::print_kv("address", &imported.address, true);
    } else {
        output::print_success("vault imported", false);
        output::print_kv("Address", &imported.address, false);
    }
    Ok(())
}

/// Checks the password and reports wallet consistency.
pub async fn unlock(opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    let password = read_password("Vault password: ")?;
    let mnemonic = vault
        .unlock_vault(&password)
        .await
        .map_err(|e| e.to_string())?;

    let registry = vault.registry();
    let mismatched = registry
        .verify_addresses(&mnemonic)
        .map_err(|e| e.to_string())?;
    let wallets = registry.list_wallets().map_err(|e| e.to_string())?;

    if opts.json {
        let obj = serde_json::json!({
            "status": "ok",
            "wallets": wallets.len(),
            "mismatched": mismatched,
        });
        println!("{obj}");
    } else {
        output::print_success("vault unlocked", false);
        output::print_kv("Wallets", &wallets.len().to_string(), false);
        for id in &mismatched {
            output::print_warning(
                &format!("wallet {id} has a stored address that does not match its index"),
                false,
            );
        }
    }
    Ok(())
}

/// Reports whether a vault exists and how many wallets are registered.
pub fn status(opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    let exists = vault.has_vault().map_err(|e| e.to_string())?;
    let wallets = vault
        .registry()
        .list_wallets()
        .map_err(|e| e.to_string())?
        .len();

    let value = serde_json::json!({
        "vault": exists,
        "wallets": wallets,
        "data_dir": opts.config.data_dir.display().to_string(),
    });
    output::print_json_value(&value, opts.json);
    Ok(())
}

/// Irreversibly deletes the vault and all wallet metadata.
pub async fn wipe(yes: bool, opts: &GlobalOpts) -> Result<(), String> {
    if !yes {
        return Err("refusing to wipe without --yes".into());
    }
    let vault = open_vault(opts)?;
    vault.wipe_vault().await.map_err(|e| e.to_string())?;
    output::print_success("vault wiped", opts.json);
    Ok(())
}

/// Refuses to replace an existing vault unless `force` is set, in which
/// case the old vault and its wallets are wiped first.
async fn clear_existing(vault: &Vault, force: bool, json: bool) -> Result<(), String> {
    if !vault.has_vault().map_err(|e| e.to_string())? {
        return Ok(());
    }
    if !force {
        return Err("a vault already exists; pass --force to replace it".into());
    }
    vault.wipe_vault().await.map_err(|e| e.to_string())?;
    output::print_warning("existing vault replaced", json);
    Ok(())
}
