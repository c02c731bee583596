//! Config file support for the `forest` binary.
//!
//! Settings come from an optional JSON file; command-line flags
//! override it.
//!
//! Example `forest.json`:
//! ```json
//! {
//!   "data_dir": "/home/alice/.forest",
//!   "vault": {
//!     "scrypt_log_n": 15,
//!     "lock_timeout_secs": 600,
//!     "max_wallets": 5
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use forest_types::config::VaultConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config file (JSON)
// ---------------------------------------------------------------------------

/// On-disk config format. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfigFile {
    pub data_dir: Option<String>,
    #[serde(default)]
    pub vault: VaultConfig,
}

// ---------------------------------------------------------------------------
// Resolved config
// ---------------------------------------------------------------------------

/// Fully resolved configuration with all defaults applied.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub vault: VaultConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            vault: VaultConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
        Self::from_json(&text)
    }

    /// Parses and validates config JSON.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let file: CliConfigFile =
            serde_json::from_str(text).map_err(|e| format!("invalid config JSON: {e}"))?;
        file.vault.validate().map_err(|e| e.to_string())?;

        Ok(Self {
            data_dir: file
                .data_dir
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
            vault: file.vault,
        })
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, data_dir: Option<&Path>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir.to_path_buf();
        }
        self
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        return home.join(".forest");
    }
    if let Some(data) = dirs::data_dir() {
        return data.join("Forest");
    }
    PathBuf::from("forest-data")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
