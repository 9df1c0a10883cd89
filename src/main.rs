use clap::Parser;
use installwatch::{
    cli::commands::{
        check::CheckCommand, clear_cache::ClearCacheCommand, scan::ScanCommand,
        status::StatusCommand, CommandHandler,
    },
    cli::{Cli, Commands, LogLevel},
    Result,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize tracing from the CLI flags.
///
/// `RUST_LOG` overrides `--log-level` when set. Logs always go to stderr so
/// stdout stays clean for command output.
fn initialize_tracing(log_level: LogLevel, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.global.log_level, cli.global.json_logs);
    debug!(command = cli.command.name(), "Dispatching command");

    let global = cli.global;
    let handler: Box<dyn CommandHandler> = match cli.command {
        Commands::Scan { catalog, json } => Box::new(ScanCommand::new(global, catalog, json)),
        Commands::Check { catalog, json } => Box::new(CheckCommand::new(global, catalog, json)),
        Commands::Status {
            catalog,
            no_scan,
            json,
        } => Box::new(StatusCommand::new(global, catalog, no_scan, json)),
        Commands::ClearCache => Box::new(ClearCacheCommand::new(global)),
    };

    handler.execute()
}
