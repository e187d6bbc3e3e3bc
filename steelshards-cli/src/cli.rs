use clap::{Parser, Subcommand};
use std::fmt::Debug;
use std::path::PathBuf;

pub const BINARY_NAME: &str = "steelshards";

#[derive(Debug, Parser)]
#[clap(name = BINARY_NAME, about = "Build Solidity projects and generate typed TypeScript clients", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve, compile and generate TypeScript for all contracts
    Build {
        /// Explicit config file
        #[clap(short = 'c', long = "config", value_parser, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Compile only; do not write JSON or TypeScript files
        #[clap(long, action, default_value = "false")]
        no_emit: bool,
    },
    /// List configured networks
    Networks {
        /// Explicit config file
        #[clap(short = 'c', long = "config", value_parser, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}
