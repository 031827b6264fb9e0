//! optarc CLI - Main entry point

use clap::Parser;
use optarc_cli::{commands, Cli, Commands};
use optarc_common::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    // Environment variables win over the verbose flag
    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if std::env::var("OPTARC_LOG_LEVEL").is_err() {
        log_config.level = if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        };
    }

    // The CLI should keep working even if logging cannot be set up
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Execute the CLI command
fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Convert {
            archive_path,
            output,
        } => commands::convert::run(archive_path, output.as_deref()),

        Commands::Validate { archive_path } => commands::validate::run(archive_path),
    }
}
