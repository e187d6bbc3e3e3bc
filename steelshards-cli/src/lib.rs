/// Command line arguments
pub mod cli;
/// Subcommand implementations
pub mod commands;
/// Terminal styles
pub mod stylist;
