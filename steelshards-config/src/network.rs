use crate::secret::{de_secret, ser_secret};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// A named chain endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Human readable network name (unique within a config)
    pub name: String,
    /// JSON-RPC endpoint
    pub rpc: Url,
    /// Chain id
    #[serde(rename = "networkID")]
    pub network_id: u64,
    /// Wallet to sign with on this network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletConfig>,
}

/// Wallet attached to a network entry.
///
/// The contents are carried as-is; signing is left to the generated client code. Key
/// material is never printed and is redacted when the config is written back.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct WalletConfig {
    /// Name shown when listing networks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Hex-encoded private key
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "ser_secret",
        deserialize_with = "de_secret"
    )]
    pub private_key: Option<SecretString>,
    /// BIP-39 seed phrase
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "ser_secret",
        deserialize_with = "de_secret"
    )]
    pub seed_phrase: Option<SecretString>,
}

impl WalletConfig {
    /// Display name, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("wallet")
    }
}
