use crate::VirtualSourceSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steelshards_config::{CompilerConfig, OptimizerConfig};

/// Source language of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Language {
    /// Solidity
    #[default]
    Solidity,
}

/// `file -> contract -> outputs` selection.
pub type OutputSelection = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Select every output of every contract in every file.
pub fn select_all() -> OutputSelection {
    BTreeMap::from([(
        "*".to_string(),
        BTreeMap::from([("*".to_string(), vec!["*".to_string()])]),
    )])
}

/// The `settings` object of a standard-JSON request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Import remappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<String>,
    /// Optimizer settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerConfig>,
    /// Target EVM version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    /// Compile through the IR pipeline
    #[serde(default, rename = "viaIR", skip_serializing_if = "Option::is_none")]
    pub via_ir: Option<bool>,
    /// Which outputs to produce
    #[serde(default = "select_all")]
    pub output_selection: OutputSelection,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            remappings: vec![],
            optimizer: None,
            evm_version: None,
            via_ir: None,
            output_selection: select_all(),
        }
    }
}

impl From<&CompilerConfig> for Settings {
    fn from(cfg: &CompilerConfig) -> Self {
        Settings {
            remappings: cfg.remappings.clone(),
            optimizer: cfg.optimizer,
            evm_version: cfg.evm_version.clone(),
            via_ir: cfg.via_ir,
            output_selection: select_all(),
        }
    }
}

/// A standard-JSON compile request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompileRequest {
    /// Always Solidity
    pub language: Language,
    /// All sources, keyed by virtual path
    pub sources: VirtualSourceSet,
    /// Compiler settings
    pub settings: Settings,
}

impl CompileRequest {
    /// Request compiling `sources` with default settings (every output selected).
    pub fn new(sources: VirtualSourceSet) -> Self {
        CompileRequest {
            language: Language::Solidity,
            sources,
            settings: Settings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}
