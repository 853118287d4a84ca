//! dirwatch CLI - report files dropped into a directory once fully written

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod config;
mod logging;

/// dirwatch - Notify when newly created files are complete
#[derive(Parser)]
#[command(name = "dirwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/dirwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory until Ctrl-C
    Watch {
        /// Directory to watch
        dir: PathBuf,
        /// Filename filter, e.g. "*.dat" (default: every file)
        #[arg(short, long, default_value = "*")]
        filter: String,
        /// Delay between readiness probes in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Delay between subscription start/stop retries in milliseconds
        #[arg(long)]
        retry_delay_ms: Option<u64>,
        /// Match the filter case-insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,
    },
    /// Check once whether a file can be opened exclusively
    Probe {
        /// File to probe
        file: PathBuf,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    let _log_guard = logging::init(&config.log)?;

    match cli.command {
        Commands::Watch {
            dir,
            filter,
            poll_interval_ms,
            retry_delay_ms,
            ignore_case,
        } => {
            let args = cmd::watch::WatchArgs {
                dir,
                filter,
                poll_interval_ms,
                retry_delay_ms,
                ignore_case,
            };
            cmd::watch::run(args, config).await
        }
        Commands::Probe { file } => cmd::probe::run(&file).await,
        Commands::Config => cmd::config::run(&config, cli.config.as_deref()).await,
    }
}
