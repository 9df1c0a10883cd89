use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// installwatch: find out which catalog programs and drivers are installed
#[derive(Parser, Debug)]
#[command(name = "installwatch")]
#[command(version)]
#[command(about = "Installed software inventory and catalog matching")]
#[command(
    long_about = "installwatch scans the installed applications and signed drivers of this machine, matches them against a catalog of programs and drivers, and caches the per-item results."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding settings.json and scan_cache.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Read the inventory from a JSON fixture instead of the system
    #[arg(long, global = true)]
    pub inventory: Option<PathBuf>,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full scan and refresh the status cache
    Scan {
        /// Catalog file whose items are resolved and cached
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Print the completion event as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan now and report every catalog item, bypassing the cache
    Check {
        /// Catalog file (JSON array of {"name", "kind"})
        #[arg(short, long)]
        catalog: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report catalog statuses, served from the cache when fresh
    Status {
        /// Catalog file (JSON array of {"name", "kind"})
        #[arg(short, long)]
        catalog: PathBuf,

        /// Never start a scan, even when the cache is stale
        #[arg(long)]
        no_scan: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Overwrite the status cache with an empty record
    ClearCache,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Scan { .. } => "scan",
            Commands::Check { .. } => "check",
            Commands::Status { .. } => "status",
            Commands::ClearCache => "clear-cache",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
