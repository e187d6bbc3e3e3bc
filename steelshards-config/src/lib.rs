#![warn(missing_docs)]

//! This crate exposes the Steelshards project configuration interface [`Config`].
//!
//! Every Steelshards project has a JSON config file `steelshards.json` in its root
//! directory, which specifies:
//! - [`inputs`](Config::inputs_dir): the directory holding contract sources (can be
//!   overridden via the `STEELSHARDS_INPUTS` env var),
//! - [`outputs`](OutputsConfig): where compiled JSON artifacts and generated
//!   TypeScript files are written,
//! - [`codeGenerationTarget`](CodegenTarget): what kind of TypeScript to generate,
//! - [`networks`](NetworkConfig): named chain endpoints,
//! - [`compiler`](CompilerConfig): how `solc` is invoked (the binary can be overridden via
//!   the `STEELSHARDS_SOLC` env var).
//!
//! Example JSON file:
//! ```
//! # use steelshards_config::Config;
//! # use serde_json::{from_str, json};
//! # let cfg_json = json!(
//! {
//!   "inputs": "contracts/",
//!   "outputs": { "json": "dist/json/", "ts": "ts/interfaces/" },
//!   "codeGenerationTarget": "ethers.js",
//!   "networks": [
//!     { "name": "Private Network", "networkID": 1337, "rpc": "http://localhost:8545" }
//!   ],
//!   "compiler": { "solc": "solc", "optimizer": { "enabled": true, "runs": 200 } }
//! }
//! # );
//! # let cfg: Config = from_str(&cfg_json.to_string()).unwrap();
//! ```
//!
//! Load config files with [`Config::nearest`], which finds the JSON file in the current
//! directory or any parent directory:
//!
//! ```no_run
//! use steelshards_config::Config;
//! let cfg = Config::nearest().unwrap();
//! ```
//!
//! Alternatively, use [`Config::from_dir`] or [`Config::from_file`].

pub use network::{NetworkConfig, WalletConfig};
use parse_display::Display;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Network (chain endpoint) configuration
pub mod network;
/// Serde helpers for key material
pub mod secret;

/// Default steelshards config filename
pub const DEFAULT_FILENAME: &str = "steelshards.json";

/// Errors raised handling configurations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error raised when we can't find the config file
    #[error("Could not find config file {}", DEFAULT_FILENAME)]
    FileNotFound,
    /// Error raised when deserialization/serialization of the config file fails.
    #[error("Malformed config {0}")]
    MalformedConfig(PathBuf, #[source] serde_json::Error),
    /// Generic path-related error, not caused by a filesystem error.
    #[error("{0}. Path: {1}")]
    PathError(&'static str, PathBuf),
    /// Generic filesystem error
    #[error("{0}. Path: {1}")]
    FsError(&'static str, PathBuf, #[source] std::io::Error),
    /// Error raised when two networks share a name.
    #[error("Network '{0}' is defined more than once")]
    DuplicateNetwork(String),
    /// Error raised when a requested network is not defined under `networks`.
    #[error("Network '{0}' not found")]
    MissingNetwork(String),
}

/// Result with error type defaulting to [`ConfigError`].
pub type Result<T, E = ConfigError> = core::result::Result<T, E>;

/// What kind of TypeScript is generated for each compiled contract.
#[derive(Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, Debug, Default)]
#[serde(deny_unknown_fields)]
pub enum CodegenTarget {
    /// Plain interface declaration (no runtime dependency).
    #[default]
    #[serde(rename = "none")]
    #[display("none")]
    None,
    /// Typed client class wrapping an `ethers.Contract`.
    #[serde(rename = "ethers.js")]
    #[display("ethers.js")]
    EthersJs,
}

/// Output directories. A missing entry means that kind of output is not written.
#[derive(PartialEq, Eq, Deserialize, Serialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    /// Directory for the per-contract JSON artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
    /// Directory for the per-contract TypeScript files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<PathBuf>,
}

/// Optimizer settings forwarded to solc.
#[derive(PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Whether the optimizer runs at all.
    pub enabled: bool,
    /// Expected number of contract runs.
    #[serde(default = "default_optimizer_runs")]
    pub runs: u32,
}

fn default_optimizer_runs() -> u32 {
    200
}

/// Compiler configuration, i.e., configurations that result in compiler flags or settings
#[derive(PartialEq, Eq, Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// The solc binary (a name looked up in `PATH` or a path).
    #[serde(default = "default_solc")]
    pub solc: PathBuf,
    /// Directory holding package-style imports (e.g., `@openzeppelin/...`).
    #[serde(default = "default_module_dir")]
    pub module_dir: PathBuf,
    /// Optimizer settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerConfig>,
    /// Target EVM version (e.g., `paris`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    /// Compile through the IR pipeline.
    #[serde(default, rename = "viaIR", skip_serializing_if = "Option::is_none")]
    pub via_ir: Option<bool>,
    /// Import remappings (`prefix=target`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            solc: default_solc(),
            module_dir: default_module_dir(),
            optimizer: None,
            evm_version: None,
            via_ir: None,
            remappings: vec![],
        }
    }
}

fn default_solc() -> PathBuf {
    PathBuf::from("solc")
}

fn default_module_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

/// Top-level steelshards project configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Absolute path to the file corresponding to this configuration.
    #[serde(skip_serializing, skip_deserializing)]
    pub config_path: PathBuf,
    /// Path to the contract sources.
    #[serde(default = "default_inputs")]
    inputs: PathBuf,
    /// Output directories.
    #[serde(default)]
    outputs: OutputsConfig,
    /// Kind of generated TypeScript.
    #[serde(default)]
    pub code_generation_target: CodegenTarget,
    /// Configured networks, in declaration order.
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
    /// Compiler configuration.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

fn default_inputs() -> PathBuf {
    PathBuf::from("contracts")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            config_path: env::current_dir().unwrap().join(DEFAULT_FILENAME),
            inputs: default_inputs(),
            outputs: OutputsConfig {
                json: Some(PathBuf::from("dist/json")),
                ts: Some(PathBuf::from("ts/interfaces")),
            },
            code_generation_target: Default::default(),
            networks: vec![],
            compiler: Default::default(),
        }
    }
}

impl Config {
    /// Create the default configuration for a project directory.
    ///
    /// # Example
    ///
    /// ```
    /// use steelshards_config::Config;
    /// use tempfile::tempdir;
    ///
    /// let dir = tempdir().unwrap();
    /// let cfg = Config::new(&dir).unwrap();
    /// assert_eq!(cfg.inputs_dir(), dir.path().canonicalize().unwrap().join("contracts"));
    ///
    /// // Save config file to disk and load it back
    /// cfg.to_file(false).unwrap();
    /// let cfg2 = Config::from_file(&cfg.config_path).unwrap();
    /// assert_eq!(cfg.inputs_dir(), cfg2.inputs_dir());
    /// ```
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let actual_dir = fs::canonicalize(dir.as_ref()).map_err(|e| {
            ConfigError::FsError("Failed to canonicalize path", dir.as_ref().into(), e)
        })?;
        Ok(Config {
            config_path: actual_dir.join(DEFAULT_FILENAME),
            ..Default::default()
        })
    }

    /// Create configuration from config file in the current directory or some parent directory.
    pub fn nearest() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            ConfigError::FsError("Failed to get current working directory", ".".into(), e)
        })?;
        Config::from_file(find_file(DEFAULT_FILENAME, cwd)?)
    }

    /// Create configuration from directory (really from [`DEFAULT_FILENAME`] file in the directory).
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Config::from_file(dir.as_ref().join(DEFAULT_FILENAME))
    }

    /// Create configuration from JSON file. Some settings can be overridden via environment
    /// variables:
    ///
    /// * Set `inputs` via `STEELSHARDS_INPUTS`
    /// * Set `compiler.solc` via `STEELSHARDS_SOLC`
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let contents = fs::read_to_string(config_path)
            .map_err(|e| ConfigError::FsError("Failed to read config file", config_path.into(), e))?;
        let mut cfg: Config = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::MalformedConfig(config_path.into(), e))?;
        cfg.config_path = fs::canonicalize(config_path).map_err(|e| {
            ConfigError::FsError("Failed to canonicalize path", config_path.into(), e)
        })?;
        cfg.merge_from_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Update config properties from environment variables.
    fn merge_from_env(&mut self) {
        if let Ok(inputs) = env::var("STEELSHARDS_INPUTS") {
            tracing::debug!("Setting inputs from STEELSHARDS_INPUTS to {}", &inputs);
            self.inputs = PathBuf::from(inputs);
        }
        if let Ok(solc) = env::var("STEELSHARDS_SOLC") {
            tracing::debug!("Setting compiler.solc from STEELSHARDS_SOLC to {}", &solc);
            self.compiler.solc = PathBuf::from(solc);
        }
    }

    /// Check that network names are unique.
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for network in &self.networks {
            if !seen.insert(network.name.as_str()) {
                return Err(ConfigError::DuplicateNetwork(network.name.clone()));
            }
        }
        Ok(())
    }

    /// Save configuration to a new file (or overwrite an existing one when `force` is set).
    pub fn to_file(&self, force: bool) -> Result<()> {
        if !force && self.config_path.is_file() {
            return Err(ConfigError::PathError(
                "Config file already exists",
                self.config_path.clone(),
            ));
        }
        let pretty = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::MalformedConfig(self.config_path.clone(), e))?;
        fs::write(&self.config_path, pretty).map_err(|e| {
            ConfigError::FsError(
                "Failed to write config to file",
                self.config_path.clone(),
                e,
            )
        })
    }

    /// Get the top-level project directory
    pub fn project_dir(&self) -> PathBuf {
        self.config_path.parent().unwrap().to_path_buf()
    }

    /// Get the absolute contract sources directory
    pub fn inputs_dir(&self) -> PathBuf {
        self.absolute_path_in_project(&self.inputs)
    }

    /// Get the absolute JSON artifacts directory (if configured)
    pub fn json_output_dir(&self) -> Option<PathBuf> {
        self.outputs
            .json
            .as_ref()
            .map(|p| self.absolute_path_in_project(p))
    }

    /// Get the absolute TypeScript output directory (if configured)
    pub fn ts_output_dir(&self) -> Option<PathBuf> {
        self.outputs
            .ts
            .as_ref()
            .map(|p| self.absolute_path_in_project(p))
    }

    /// Get the absolute directory holding package-style imports
    pub fn module_dir(&self) -> PathBuf {
        self.absolute_path_in_project(&self.compiler.module_dir)
    }

    /// Look up a network by name.
    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ConfigError::MissingNetwork(name.to_string()))
    }

    /// The network selected when none is named explicitly (the first one declared).
    pub fn default_network(&self) -> Option<&NetworkConfig> {
        self.networks.first()
    }

    /// Given a relative path, return absolute path prefixed by project root; otherwise return the
    /// absolute path.
    fn absolute_path_in_project(&self, path: impl AsRef<Path>) -> PathBuf {
        if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf().clean()
        } else {
            self.project_dir().join(path).clean()
        }
    }
}

/// Find file starting from directory.
///
/// # Errors
///
/// Fails with [`ConfigError::FileNotFound`] if we cannot find the file.
fn find_file(file: impl AsRef<Path>, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let mut path: PathBuf = PathBuf::from(dir.as_ref());

    loop {
        let candidate = path.join(file.as_ref());
        if candidate.is_file() {
            break Ok(candidate);
        }
        if !path.pop() {
            break Err(ConfigError::FileNotFound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serial_test::serial;

    use std::fs;
    use tempfile::tempdir;

    #[rstest]
    #[case::none("\"none\"", CodegenTarget::None)]
    #[case::ethers("\"ethers.js\"", CodegenTarget::EthersJs)]
    fn codegen_target_names(#[case] json: &str, #[case] target: CodegenTarget) {
        assert_eq!(serde_json::from_str::<CodegenTarget>(json).unwrap(), target);
        assert_eq!(format!("\"{target}\""), json);
    }

    #[test]
    fn codegen_target_rejects_unknown() {
        assert!(serde_json::from_str::<CodegenTarget>("\"web3\"").is_err());
    }

    #[test]
    fn should_find_file() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let file_path = tmp.path().join("a.foo");

        fs::write(&file_path, "{}").unwrap();
        let found_file = find_file("a.foo", &nested).unwrap();
        assert_eq!(found_file, nested.join("../../a.foo").clean());
    }

    #[test]
    fn should_not_find_file() {
        let tmp = tempdir().unwrap();

        match find_file("a.foo", &tmp) {
            Err(ConfigError::FileNotFound) => {}
            _ => panic!("Found file that should not exist"),
        };
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(DEFAULT_FILENAME), "{}").unwrap();

        let cfg = Config::from_dir(&tmp).unwrap();
        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(cfg.inputs_dir(), root.join("contracts"));
        assert_eq!(cfg.json_output_dir(), None);
        assert_eq!(cfg.ts_output_dir(), None);
        assert_eq!(cfg.module_dir(), root.join("node_modules"));
        assert_eq!(cfg.code_generation_target, CodegenTarget::None);
        assert_eq!(cfg.compiler.solc, PathBuf::from("solc"));
        assert!(cfg.networks.is_empty());
        assert!(cfg.default_network().is_none());
    }

    #[test]
    #[serial]
    fn test_full_config() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FILENAME),
            r#"
            {
              "inputs": "./src/contracts/",
              "outputs": { "json": "dist/json/", "ts": "../ts" },
              "codeGenerationTarget": "ethers.js",
              "networks": [
                { "name": "local", "networkID": 1337, "rpc": "http://localhost:8545" },
                { "name": "other", "networkID": 5, "rpc": "https://example.com/rpc",
                  "wallet": { "displayName": "me", "privateKey": "0x01" } }
              ],
              "compiler": {
                "solc": "/opt/solc",
                "moduleDir": "deps",
                "optimizer": { "enabled": true },
                "evmVersion": "paris",
                "viaIR": true,
                "remappings": ["@oz/=deps/oz/"]
              }
            }
        "#,
        )
        .unwrap();

        let cfg = Config::from_dir(&tmp).unwrap();
        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(cfg.inputs_dir(), root.join("src/contracts"));
        assert_eq!(cfg.json_output_dir(), Some(root.join("dist/json")));
        assert_eq!(cfg.ts_output_dir(), Some(root.join("../ts").clean()));
        assert_eq!(cfg.module_dir(), root.join("deps"));
        assert_eq!(cfg.code_generation_target, CodegenTarget::EthersJs);
        assert_eq!(cfg.compiler.solc, PathBuf::from("/opt/solc"));
        assert_eq!(
            cfg.compiler.optimizer,
            Some(OptimizerConfig {
                enabled: true,
                runs: 200
            })
        );
        assert_eq!(cfg.compiler.evm_version.as_deref(), Some("paris"));
        assert_eq!(cfg.compiler.via_ir, Some(true));
        assert_eq!(cfg.compiler.remappings, vec!["@oz/=deps/oz/".to_string()]);

        assert_eq!(cfg.default_network().unwrap().name, "local");
        let other = cfg.network("other").unwrap();
        assert_eq!(other.network_id, 5);
        assert_eq!(other.rpc.as_str(), "https://example.com/rpc");
        assert_eq!(other.wallet.as_ref().unwrap().display_name(), "me");
        assert!(matches!(
            cfg.network("nope"),
            Err(ConfigError::MissingNetwork(name)) if name == "nope"
        ));
    }

    #[test]
    #[serial]
    fn test_saved_config_redacts_wallet() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FILENAME),
            r#"{ "networks": [ { "name": "local", "networkID": 1337, "rpc": "http://localhost:8545",
                   "wallet": { "privateKey": "0xc0ffee" } } ] }"#,
        )
        .unwrap();

        let mut cfg = Config::from_dir(&tmp).unwrap();
        cfg.config_path = tmp.path().join("saved.json");
        cfg.to_file(false).unwrap();
        let saved = fs::read_to_string(&cfg.config_path).unwrap();
        assert!(!saved.contains("c0ffee"));
        assert!(saved.contains(secret::REDACTED));
    }

    #[test]
    fn test_deny_unknown_fields() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FILENAME),
            r#" { "inputs": "contracts", "bad-field": false } "#,
        )
        .unwrap();

        match Config::from_dir(&tmp) {
            Err(ConfigError::MalformedConfig(..)) => {}
            other => panic!("Should have failed to parse, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_codegen_target() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FILENAME),
            r#" { "codeGenerationTarget": "web3.js" } "#,
        )
        .unwrap();

        assert!(matches!(
            Config::from_dir(&tmp),
            Err(ConfigError::MalformedConfig(..))
        ));
    }

    #[test]
    fn test_duplicate_network() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FILENAME),
            r#"
            { "networks": [
                { "name": "dup", "networkID": 1, "rpc": "http://localhost:1000" },
                { "name": "dup", "networkID": 2, "rpc": "http://localhost:2000" }
            ] }
        "#,
        )
        .unwrap();

        match Config::from_dir(&tmp) {
            Err(ConfigError::DuplicateNetwork(name)) => assert_eq!("dup", name),
            other => panic!("Expected `DuplicateNetwork` error, got: {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(DEFAULT_FILENAME), "{}").unwrap();

        env::set_var("STEELSHARDS_INPUTS", "sol");
        env::set_var("STEELSHARDS_SOLC", "/usr/local/bin/solc-0.8.20");
        let cfg = Config::from_dir(&tmp);
        env::remove_var("STEELSHARDS_INPUTS");
        env::remove_var("STEELSHARDS_SOLC");

        let cfg = cfg.unwrap();
        assert_eq!(
            cfg.inputs_dir(),
            tmp.path().canonicalize().unwrap().join("sol")
        );
        assert_eq!(
            cfg.compiler.solc,
            PathBuf::from("/usr/local/bin/solc-0.8.20")
        );
    }

    #[test]
    fn test_fail_on_bogus_dir() {
        let tmp = tempdir().unwrap();
        match Config::new(tmp.path().join("missing")) {
            Err(ConfigError::FsError(..)) => {}
            _ => panic!("Should have failed"),
        }
    }

    #[test]
    #[serial]
    fn test_to_file_refuses_overwrite() {
        let tmp = tempdir().unwrap();
        let cfg = Config::new(&tmp).unwrap();
        cfg.to_file(false).unwrap();
        assert!(matches!(
            cfg.to_file(false),
            Err(ConfigError::PathError(..))
        ));
        cfg.to_file(true).unwrap();

        let reloaded = Config::from_file(&cfg.config_path).unwrap();
        assert_eq!(reloaded.json_output_dir(), cfg.json_output_dir());
        assert_eq!(reloaded.ts_output_dir(), cfg.ts_output_dir());
    }
}
