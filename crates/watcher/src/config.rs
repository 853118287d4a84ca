//! Watcher tuning knobs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delays used by the session lifecycle and the readiness poll
///
/// Loaded from the `[watcher]` table of the CLI config file; every field
/// falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Delay between attempts to enable or disable a subscription
    pub retry_delay_ms: u64,

    /// Delay between readiness probes of a pending file
    pub poll_interval_ms: u64,

    /// Match the filename filter case-insensitively
    pub case_insensitive: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 10,
            poll_interval_ms: 5,
            case_insensitive: false,
        }
    }
}

impl WatcherConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
