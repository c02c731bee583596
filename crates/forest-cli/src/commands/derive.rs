//! Account derivation command.

use crate::commands::{open_vault, read_password};
use crate::output;
use crate::GlobalOpts;

/// Prints `count` accounts starting at `index`.
pub async fn run(index: u32, count: u32, opts: &GlobalOpts) -> Result<(), String> {
    if count == 0 {
        return Err("--count must be at least 1".into());
    }
    let end = index
        .checked_add(count)
        .ok_or_else(|| "index range overflows".to_string())?;

    let vault = open_vault(opts)?;
    let password = read_password("Vault password: ")?;
    let mnemonic = vault
        .unlock_vault(&password)
        .await
        .map_err(|e| e.to_string())?;

    let accounts = forest_vault::derive_accounts(&mnemonic, index..end).map_err(|e| e.to_string())?;
    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| vec![a.index().to_string(), a.path(), a.address()])
        .collect();

    output::print_table(&["index", "path", "address"], &rows, opts.json);
    Ok(())
}
