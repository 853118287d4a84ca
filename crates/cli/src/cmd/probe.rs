//! One-shot readiness probe

use anyhow::Result;
use dirwatch::{ExclusiveOpen, ReadinessProbe};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(file: &Path) -> Result<()> {
    if ExclusiveOpen.is_ready(file) {
        println!("{} {}", "ready".green().bold(), file.display());
        Ok(())
    } else {
        anyhow::bail!("{} is not ready (missing, unreadable or locked)", file.display());
    }
}
