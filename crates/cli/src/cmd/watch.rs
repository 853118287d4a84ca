//! Watch a directory and print files as they become ready

use crate::config::CliConfig;
use anyhow::{Context, Result};
use dirwatch::{ContainerWatcher, Notification};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

pub struct WatchArgs {
    pub dir: PathBuf,
    pub filter: String,
    pub poll_interval_ms: Option<u64>,
    pub retry_delay_ms: Option<u64>,
    pub ignore_case: bool,
}

pub async fn run(args: WatchArgs, mut config: CliConfig) -> Result<()> {
    apply_overrides(&args, &mut config);

    // The session start retries forever, so catch a typo up front
    anyhow::ensure!(
        args.dir.is_dir(),
        "Not a directory: {}",
        args.dir.display()
    );

    let watcher = ContainerWatcher::builder(&args.dir, args.filter.as_str())
        .config(config.watcher)
        .build()
        .context("Failed to create watcher")?;
    let watcher = Arc::new(watcher);
    let notifications = watcher.subscribe();

    let starter = watcher.clone();
    tokio::task::spawn_blocking(move || starter.start_watching())
        .await
        .context("Watcher start task failed")?
        .context("Failed to start watcher")?;

    println!(
        "{} {} {}",
        "Watching".bold(),
        watcher.path().display(),
        format!("(filter: {})", watcher.filter()).dimmed()
    );

    // Ends once the watcher is dropped and the channel disconnects
    let printer = tokio::task::spawn_blocking(move || {
        for notification in notifications {
            match notification {
                Notification::NewFileCreated(path) => {
                    println!("{} {}", "ready".green().bold(), path.display());
                }
                Notification::WatcherWillStartAgain => {
                    println!("{}", "watcher restarting".yellow());
                }
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    println!("{}", "Stopping...".dimmed());

    tokio::task::spawn_blocking(move || {
        watcher.shutdown();
        drop(watcher);
    })
    .await
    .context("Watcher shutdown task failed")?;

    printer.await.context("Printer task failed")?;
    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(args: &WatchArgs, config: &mut CliConfig) {
    if let Some(ms) = args.poll_interval_ms {
        config.watcher.poll_interval_ms = ms;
    }
    if let Some(ms) = args.retry_delay_ms {
        config.watcher.retry_delay_ms = ms;
    }
    if args.ignore_case {
        config.watcher.case_insensitive = true;
    }
}
