use crate::stylist;
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::style;
use steelshards_config::Config;
use steelshards_sdk::build::Builder;
use steelshards_sdk::compiler::{DiagnosticReport, Severity, SolcGateway};
use steelshards_sdk::SteelshardsError;

/// Print a diagnostic with the source lines it points at.
fn print_report(report: &DiagnosticReport) {
    let d = &report.diagnostic;
    let label = match d.severity {
        Severity::Error => stylist::error("error"),
        Severity::Warning => stylist::warning("warning"),
        Severity::Info => stylist::info("info"),
    };
    println!("{label} while compiling {}: {}", d.file(), d.summary());
    for (num, line) in &report.lines {
        println!(" {} | {line}", stylist::line_number(format!("{num:>3}")));
    }
}

/// Build the project: resolve imports, compile, and write artifacts.
pub async fn build(cfg: &Config, no_emit: bool) -> Result<()> {
    let solc = SolcGateway::from_config(cfg);
    println!(
        "{} {}",
        style("Compiling").bold().green(),
        cfg.inputs_dir().display()
    );

    match Builder::new(cfg, &solc).build(no_emit).await {
        Ok(report) => {
            report.diagnostics.iter().for_each(print_report);
            for path in &report.emitted {
                println!("- {} {}", style("wrote").green().dim(), path.display());
            }
            Ok(())
        }
        Err(SteelshardsError::Diagnostics(err)) => {
            err.reports.iter().for_each(print_report);
            Err(eyre!(
                "Compilation failed with {} error(s)",
                err.errors().count()
            ))
        }
        Err(SteelshardsError::MissingImport { path, source_file }) => {
            println!(
                "{} File not found: {}",
                stylist::error("error"),
                path.display()
            );
            if let Some(file) = source_file {
                println!("  -> imported from {}", file.display());
            }
            Err(eyre!("Error while resolving imports"))
        }
        Err(e) => Err(e).wrap_err("Build failed"),
    }
}
