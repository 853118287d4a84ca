//! Show the effective configuration

use crate::config::{self, CliConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config: &CliConfig, explicit: Option<&Path>) -> Result<()> {
    let location = match explicit {
        Some(path) => path.display().to_string(),
        None => match config::config_file_path() {
            Some(path) if path.exists() => path.display().to_string(),
            Some(path) => format!("{} (not present, using defaults)", path.display()),
            None => "defaults".to_string(),
        },
    };

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), location.dimmed());

    let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{text}");
    Ok(())
}
