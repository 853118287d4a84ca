//! CLI configuration file
//!
//! ```toml
//! [watcher]
//! retry_delay_ms = 10
//! poll_interval_ms = 5
//! case_insensitive = false
//!
//! [log]
//! level = "info"
//! file = "/var/log/dirwatch.log"
//! ```

use anyhow::{Context, Result};
use dirwatch::WatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub watcher: WatcherConfig,
    pub log: LogConfig,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,

    /// Write logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Default location: `<config dir>/dirwatch/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dirwatch").join("config.toml"))
}

/// Load configuration
///
/// An explicitly given file must exist. Without one, the default location
/// is read if present, otherwise defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<CliConfig> {
    match explicit {
        Some(path) => read(path),
        None => match config_file_path() {
            Some(path) if path.exists() => read(&path),
            _ => Ok(CliConfig::default()),
        },
    }
}

fn read(path: &Path) -> Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn parse(contents: &str) -> Result<CliConfig> {
    Ok(toml::from_str(contents)?)
}
