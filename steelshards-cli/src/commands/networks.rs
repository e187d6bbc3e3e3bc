use console::style;
use steelshards_config::Config;

/// Print the configured networks, in declaration order.
pub fn list(cfg: &Config) {
    println!("{}", style("Available Networks:").bold());
    if cfg.networks.is_empty() {
        println!("  (no networks configured)");
    }
    for (i, network) in cfg.networks.iter().enumerate() {
        println!(
            "  {}. {} (id {}) {}",
            i + 1,
            style(&network.name).bold(),
            network.network_id,
            style(&network.rpc).dim()
        );
        if let Some(wallet) = &network.wallet {
            println!("     wallet: {}", wallet.display_name());
        }
    }
}
