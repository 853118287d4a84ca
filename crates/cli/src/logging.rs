//! Tracing subscriber setup

use crate::config::LogConfig;
use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global subscriber
///
/// When logging to a file, the returned guard must be kept alive until exit
/// so buffered lines are flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let level = parse_level(&config.level)?;

    match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| anyhow::anyhow!("Unknown log level: {level}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" WARN ").unwrap(), Level::WARN);
        assert!(parse_level("loud").is_err());
    }
}
