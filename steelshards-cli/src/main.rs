use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use console::style;
use std::path::PathBuf;
use steelshards_cli::cli::{Cli, Commands};
use steelshards_cli::commands::{build::build, networks};
use steelshards_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();
    let args = Cli::parse();

    let load_config = |path: &Option<PathBuf>| {
        match path {
            None => Config::nearest(),
            Some(file) => Config::from_file(file),
        }
        .wrap_err("Could not load config")
    };

    match args.command {
        Commands::Build { config, no_emit } => {
            let cfg = load_config(&config)?;
            build(&cfg, no_emit).await?;
        }
        Commands::Networks { config } => {
            let cfg = load_config(&config)?;
            networks::list(&cfg);
            return Ok(());
        }
    }

    println!("{}", style("Done!").bold().green());
    Ok(())
}
