//! Forest vault command line.
//!
//! Drives the local vault directly: no daemon, no network. Secrets are
//! read from `FOREST_PASSWORD` / `FOREST_MNEMONIC` when set, otherwise
//! prompted for on stderr.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Forest: encrypted local vault for an EVM wallet.
#[derive(Parser)]
#[command(name = "forest", version, about)]
struct Cli {
    /// Output in JSON format (no colors, machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the vault database.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new recovery phrase and seal it in the vault.
    Create {
        /// Replace an existing vault and its wallets.
        #[arg(long)]
        force: bool,
    },
    /// Seal an existing recovery phrase in the vault.
    Import {
        /// Replace an existing vault and its wallets.
        #[arg(long)]
        force: bool,
    },
    /// Check the password and the stored wallet addresses.
    Unlock,
    /// Show derived accounts without registering them.
    Derive {
        /// First account index.
        #[arg(long, default_value = "0")]
        index: u32,
        /// Number of consecutive accounts.
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Manage registered wallets.
    Wallets {
        #[command(subcommand)]
        action: commands::wallets::WalletsAction,
    },
    /// Delete the vault and all wallet metadata.
    Wipe {
        /// Confirm the irreversible wipe.
        #[arg(long)]
        yes: bool,
    },
    /// Show whether a vault exists.
    Status,
}

// ---------------------------------------------------------------------------
// Global options passed to every command handler
// ---------------------------------------------------------------------------

/// Shared options threaded into command handlers.
pub struct GlobalOpts {
    pub json: bool,
    pub config: CliConfig,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays parseable in --json mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let result = match resolve_config(cli.config.as_deref(), cli.data_dir.as_deref()) {
        Ok(config) => dispatch(GlobalOpts { json, config }, cli.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output::print_error(&e, json);
        std::process::exit(1);
    }
}

fn resolve_config(
    path: Option<&std::path::Path>,
    data_dir: Option<&std::path::Path>,
) -> Result<CliConfig, String> {
    let base = match path {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let config = base.merge_cli(data_dir);
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration resolved");
    Ok(config)
}

async fn dispatch(opts: GlobalOpts, cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Create { force } => commands::vault::create(force, &opts).await,
        Commands::Import { force } => commands::vault::import(force, &opts).await,
        Commands::Unlock => commands::vault::unlock(&opts).await,
        Commands::Derive { index, count } => commands::derive::run(index, count, &opts).await,
        Commands::Wallets { action } => commands::wallets::run(action, &opts).await,
        Commands::Wipe { yes } => commands::vault::wipe(yes, &opts).await,
        Commands::Status => commands::vault::status(&opts),
    }
}
