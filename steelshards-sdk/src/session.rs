use crate::build::{BuildReport, Builder};
use crate::compiler::{CompilerBackend, ContractArtifact};
use crate::{Result, SteelshardsError};
use steelshards_config::{Config, NetworkConfig, WalletConfig};
use tracing::info;

/// State shared by the commands of one interactive session: the project config, the
/// last build, and the selected network and signer.
///
/// Command handlers take the session explicitly; nothing here is global.
pub struct Session<C: CompilerBackend> {
    config: Config,
    compiler: C,
    last_build: Option<BuildReport>,
    active_network: Option<NetworkConfig>,
    active_signer: Option<WalletConfig>,
}

impl<C: CompilerBackend> Session<C> {
    /// Start a session on the first configured network (if any).
    pub fn new(config: Config, compiler: C) -> Self {
        let active_network = config.default_network().cloned();
        let active_signer = active_network.as_ref().and_then(|n| n.wallet.clone());
        Session {
            config,
            compiler,
            last_build: None,
            active_network,
            active_signer,
        }
    }

    /// The project configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration, e.g. after the config file changed.
    ///
    /// The selected network is kept if it still exists, otherwise the session falls back
    /// to the first configured network. The last build is kept.
    pub fn reload_config(&mut self, config: Config) {
        let keep = self
            .active_network
            .as_ref()
            .and_then(|n| config.network(&n.name).ok())
            .or_else(|| config.default_network())
            .cloned();
        self.active_signer = keep.as_ref().and_then(|n| n.wallet.clone());
        self.active_network = keep;
        self.config = config;
    }

    /// Build the project and remember the result.
    ///
    /// A failed build forgets the previous one.
    pub async fn build(&mut self, no_emit: bool) -> Result<&BuildReport> {
        self.last_build = None;
        let report = Builder::new(&self.config, &self.compiler).build(no_emit).await?;
        Ok(self.last_build.insert(report))
    }

    /// The last successful build, if any.
    pub fn last_build(&self) -> Option<&BuildReport> {
        self.last_build.as_ref()
    }

    /// Look up a contract of the last build by name.
    pub fn artifact(&self, name: &str) -> Result<&ContractArtifact> {
        self.last_build
            .as_ref()
            .ok_or(SteelshardsError::NoBuild)?
            .find_contract(name)
            .ok_or_else(|| SteelshardsError::UnknownContract(name.to_string()))
    }

    /// Select a configured network (and its wallet as the signer).
    pub fn select_network(&mut self, name: &str) -> Result<&NetworkConfig> {
        let network = self.config.network(name)?.clone();
        info!("Using network {} ({})", network.name, network.rpc);
        self.active_signer = network.wallet.clone();
        Ok(self.active_network.insert(network))
    }

    /// The selected network.
    pub fn active_network(&self) -> Option<&NetworkConfig> {
        self.active_network.as_ref()
    }

    /// The wallet of the selected network.
    pub fn active_signer(&self) -> Option<&WalletConfig> {
        self.active_signer.as_ref()
    }
}
