//! Wallet registry commands.

use clap::Subcommand;
use forest_vault::{SessionCache, SessionConfig};

use crate::commands::{open_vault, read_password};
use crate::output;
use crate::GlobalOpts;

#[derive(Subcommand)]
pub enum WalletsAction {
    /// List registered wallets.
    List,
    /// Derive and register new wallets at the next free indices.
    Add {
        /// Name for the new wallet (defaults to "Wallet N").
        #[arg(long)]
        name: Option<String>,
        /// Number of wallets to add.
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Remove a wallet by id. Its index is never reissued.
    Remove {
        /// Wallet id as shown by `wallets list`.
        id: String,
    },
}

pub async fn run(action: WalletsAction, opts: &GlobalOpts) -> Result<(), String> {
    match action {
        WalletsAction::List => list(opts),
        WalletsAction::Add { name, count } => add(name, count, opts).await,
        WalletsAction::Remove { id } => remove(&id, opts),
    }
}

fn list(opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    let wallets = vault
        .registry()
        .list_wallets()
        .map_err(|e| e.to_string())?;

    let rows: Vec<Vec<String>> = wallets
        .into_iter()
        .map(|w| vec![w.id, w.name, w.derivation_index.to_string(), w.address])
        .collect();
    output::print_table(&["id", "name", "index", "address"], &rows, opts.json);
    Ok(())
}

/// Adds wallets, prompting for the password once and reusing it from a
/// session for every further wallet.
async fn add(name: Option<String>, count: u32, opts: &GlobalOpts) -> Result<(), String> {
    if count == 0 {
        return Err("--count must be at least 1".into());
    }
    if count > 1 && name.is_some() {
        return Err("--name can only be used when adding a single wallet".into());
    }

    let vault = open_vault(opts)?;
    let session = SessionCache::new(SessionConfig::from_vault_config(vault.config()))
        .map_err(|e| e.to_string())?;

    let password = read_password("Vault password: ")?;
    vault
        .unlock_session(&password, &session)
        .await
        .map_err(|e| e.to_string())?;
    drop(password);

    let name = name.map(|n| output::sanitize_name(&n));
    let mut rows = Vec::new();
    for _ in 0..count {
        let password = session
            .get_password()
            .ok_or_else(|| "session locked before all wallets were added".to_string())?;
        let wallet = vault
            .create_additional_wallet(&password, name.as_deref())
            .await
            .map_err(|e| e.to_string())?;
        rows.push(vec![
            wallet.id,
            wallet.name,
            wallet.derivation_index.to_string(),
            wallet.address,
        ]);
    }
    session.shutdown();

    output::print_table(&["id", "name", "index", "address"], &rows, opts.json);
    Ok(())
}

fn remove(id: &str, opts: &GlobalOpts) -> Result<(), String> {
    let vault = open_vault(opts)?;
    let removed = vault
        .registry()
        .remove_wallet(id)
        .map_err(|e| e.to_string())?;
    if !removed {
        return Err(format!("wallet not found: {id}"));
    }
    output::print_success(&format!("wallet {id} removed"), opts.json);
    Ok(())
}
