//! CLI integration tests.
//!
//! Runs the `forest` binary against a throwaway data directory. A config
//! file lowers the scrypt cost so each invocation stays fast.

use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon \
                             abandon abandon abandon abandon abandon about";
const ABANDON_ADDRESS_0: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
const ABANDON_ADDRESS_1: &str = "0x6Fac4D18c912343BF86fa7049364Dd4E424Ab9C0";

/// Runs the binary and returns (exit_code, stdout, stderr).
fn run_cli(args: &[&str], envs: &[(&str, &str)]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_forest"))
        .args(args)
        .env_remove("FOREST_PASSWORD")
        .env_remove("FOREST_MNEMONIC")
        .env_remove("RUST_LOG")
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(o) => (
            o.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&o.stdout).to_string(),
            String::from_utf8_lossy(&o.stderr).to_string(),
        ),
        Err(e) => (-1, String::new(), e.to_string()),
    }
}

/// A data directory plus a low-cost config file inside it.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = serde_json::json!({
            "data_dir": dir.path().join("data").display().to_string(),
            "vault": { "scrypt_log_n": 8, "max_wallets": 3 }
        });
        std::fs::write(dir.path().join("forest.json"), config.to_string()).expect("write config");
        Self { dir }
    }

    fn config_path(&self) -> String {
        self.dir.path().join("forest.json").display().to_string()
    }

    /// Runs a command with `--config` and `--json` prepended.
    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> (i32, String, String) {
        let config = self.config_path();
        let mut full = vec!["--json", "--config", config.as_str()];
        full.extend_from_slice(args);
        run_cli(&full, envs)
    }

    fn import(&self) {
        let (code, stdout, stderr) = self.run(
            &["import"],
            &[("FOREST_PASSWORD", "pw"), ("FOREST_MNEMONIC", ABANDON_ABOUT)],
        );
        assert_eq!(code, 0, "import failed: {stderr}");
        assert!(stdout.contains(ABANDON_ADDRESS_0), "stdout: {stdout}");
    }

    fn data_dir(&self) -> &Path {
        self.dir.path()
    }
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout should be JSON")
}

// -----------------------------------------------------------------------
// Clap parsing
// -----------------------------------------------------------------------

#[test]
fn help_flag_exits_zero() {
    let (code, stdout, _) = run_cli(&["--help"], &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wallets"), "help should list subcommands");
}

#[test]
fn version_flag_exits_zero() {
    let (code, stdout, _) = run_cli(&["--version"], &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("forest"));
}

#[test]
fn unknown_command_fails() {
    let (code, _, _) = run_cli(&["frobnicate"], &[]);
    assert_ne!(code, 0);
}

#[test]
fn derive_rejects_non_numeric_index() {
    let (code, _, stderr) = run_cli(&["derive", "--index", "abc"], &[]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid value"), "stderr: {stderr}");
}

#[test]
fn missing_config_file_is_reported() {
    let (code, _, stderr) = run_cli(
        &["--json", "--config", "/nonexistent/forest.json", "status"],
        &[],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error"), "stderr: {stderr}");
}

// -----------------------------------------------------------------------
// End to end
// -----------------------------------------------------------------------

#[test]
fn status_on_empty_data_dir() {
    let sandbox = Sandbox::new();
    let (code, stdout, stderr) = sandbox.run(&["status"], &[]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let value = parse_json(&stdout);
    assert_eq!(value["vault"], false);
    assert_eq!(value["wallets"], 0);
}

#[test]
fn import_registers_default_wallet() {
    let sandbox = Sandbox::new();
    sandbox.import();

    let (code, stdout, _) = sandbox.run(&["wallets", "list"], &[]);
    assert_eq!(code, 0);
    let value = parse_json(&stdout);
    let rows = value.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Wallet 1");
    assert_eq!(rows[0]["index"], "0");
    assert_eq!(rows[0]["address"], ABANDON_ADDRESS_0);
}

#[test]
fn import_refuses_to_overwrite_without_force() {
    let sandbox = Sandbox::new();
    sandbox.import();

    let (code, _, stderr) = sandbox.run(
        &["import"],
        &[("FOREST_PASSWORD", "pw"), ("FOREST_MNEMONIC", ABANDON_ABOUT)],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("--force"), "stderr: {stderr}");
}

#[test]
fn invalid_phrase_is_rejected() {
    let sandbox = Sandbox::new();
    let bad = ABANDON_ABOUT.replace("about", "abandon");
    let (code, _, stderr) = sandbox.run(
        &["import"],
        &[("FOREST_PASSWORD", "pw"), ("FOREST_MNEMONIC", bad.as_str())],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("mnemonic"), "stderr: {stderr}");
}

#[test]
fn unlock_with_wrong_password_fails() {
    let sandbox = Sandbox::new();
    sandbox.import();

    let (code, _, _) = sandbox.run(&["unlock"], &[("FOREST_PASSWORD", "pw")]);
    assert_eq!(code, 0);

    let (code, _, stderr) = sandbox.run(&["unlock"], &[("FOREST_PASSWORD", "nope")]);
    assert_eq!(code, 1);
    assert!(stderr.contains("authentication failure"), "stderr: {stderr}");
}

#[test]
fn password_whitespace_is_significant() {
    let sandbox = Sandbox::new();
    let (code, _, stderr) = sandbox.run(
        &["import"],
        &[("FOREST_PASSWORD", " pw "), ("FOREST_MNEMONIC", ABANDON_ABOUT)],
    );
    assert_eq!(code, 0, "import failed: {stderr}");

    let (code, _, stderr) = sandbox.run(&["unlock"], &[("FOREST_PASSWORD", "pw")]);
    assert_eq!(code, 1);
    assert!(stderr.contains("authentication failure"), "stderr: {stderr}");

    let (code, stdout, stderr) = sandbox.run(&["unlock"], &[("FOREST_PASSWORD", " pw ")]);
    assert_eq!(code, 0, "unlock failed: {stderr}");
    assert_eq!(parse_json(&stdout)["status"], "ok");
}

#[test]
fn derive_lists_accounts() {
    let sandbox = Sandbox::new();
    sandbox.import();

    let (code, stdout, stderr) = sandbox.run(
        &["derive", "--index", "0", "--count", "2"],
        &[("FOREST_PASSWORD", "pw")],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    let value = parse_json(&stdout);
    assert_eq!(value[0]["path"], "m/44'/60'/0'/0/0");
    assert_eq!(value[0]["address"], ABANDON_ADDRESS_0);
    assert_eq!(value[1]["address"], ABANDON_ADDRESS_1);
}

#[test]
fn wallets_add_remove_and_limit() {
    let sandbox = Sandbox::new();
    sandbox.import();
    let pw = [("FOREST_PASSWORD", "pw")];

    let (code, stdout, stderr) = sandbox.run(&["wallets", "add", "--name", "Savings"], &pw);
    assert_eq!(code, 0, "stderr: {stderr}");
    let added = parse_json(&stdout);
    assert_eq!(added[0]["name"], "Savings");
    assert_eq!(added[0]["address"], ABANDON_ADDRESS_1);

    let id = added[0]["id"].as_str().expect("id").to_string();
    let (code, _, _) = sandbox.run(&["wallets", "remove", &id], &[]);
    assert_eq!(code, 0);

    // Index 1 is retired; the next wallet lands on index 2.
    let (code, stdout, _) = sandbox.run(&["wallets", "add", "--count", "2"], &pw);
    assert_eq!(code, 0);
    let added = parse_json(&stdout);
    assert_eq!(added[0]["index"], "2");
    assert_eq!(added[1]["index"], "3");

    // max_wallets is 3 in the sandbox config.
    let (code, _, stderr) = sandbox.run(&["wallets", "add"], &pw);
    assert_eq!(code, 1);
    assert!(stderr.contains("maximum"), "stderr: {stderr}");
}

#[test]
fn remove_unknown_wallet_fails() {
    let sandbox = Sandbox::new();
    let (code, _, stderr) = sandbox.run(&["wallets", "remove", "deadbeef"], &[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("deadbeef"));
}

#[test]
fn wipe_requires_confirmation_and_clears_everything() {
    let sandbox = Sandbox::new();
    sandbox.import();

    let (code, _, _) = sandbox.run(&["wipe"], &[]);
    assert_eq!(code, 1);

    let (code, _, _) = sandbox.run(&["wipe", "--yes"], &[]);
    assert_eq!(code, 0);

    let (_, stdout, _) = sandbox.run(&["status"], &[]);
    let value = parse_json(&stdout);
    assert_eq!(value["vault"], false);
    assert_eq!(value["wallets"], 0);
    assert!(sandbox.data_dir().join("data").exists());
}

#[test]
fn create_prints_phrase_that_reimports_to_same_address() {
    let sandbox = Sandbox::new();
    let (code, stdout, stderr) = sandbox.run(&["create"], &[("FOREST_PASSWORD", "pw")]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let created = parse_json(&stdout);
    let phrase = created["mnemonic"].as_str().expect("mnemonic").to_string();
    let address = created["address"].as_str().expect("address").to_string();
    assert_eq!(phrase.split(' ').count(), 12);

    let (code, stdout, _) = sandbox.run(
        &["import", "--force"],
        &[("FOREST_PASSWORD", "other"), ("FOREST_MNEMONIC", phrase.as_str())],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains(&address));
}
