//! Filename filter for watched directories
//!
//! Patterns are matched against the file name only, never the directory
//! part of the path. Supported forms:
//! 1. Empty, `*` or `*.*`: every name matches (`*.*` also covers names
//!    without an extension)
//! 2. Glob patterns such as `*.dat` or `report-??.csv`

use crate::error::{Result, WatchError};
use ignore::overrides::{Override, OverrideBuilder};
use std::path::Path;

/// Compiled filename filter
#[derive(Debug, Clone)]
pub struct FilenameFilter {
    pattern: String,

    /// `None` matches everything
    globs: Option<Override>,
}

impl FilenameFilter {
    /// Compile `pattern`
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let trimmed = pattern.trim();
        if matches!(trimmed, "" | "*" | "*.*") {
            return Ok(Self {
                pattern: pattern.to_string(),
                globs: None,
            });
        }

        // A leading `!` would turn the glob into an exclusion
        if trimmed.starts_with('!') || trimmed.contains('/') {
            return Err(invalid(
                pattern,
                ignore::Error::Glob {
                    glob: Some(trimmed.to_string()),
                    err: "filter must be a plain filename glob".to_string(),
                },
            ));
        }

        let mut builder = OverrideBuilder::new("");
        builder
            .case_insensitive(case_insensitive)
            .map_err(|e| invalid(pattern, e))?;
        builder.add(trimmed).map_err(|e| invalid(pattern, e))?;
        let globs = builder.build().map_err(|e| invalid(pattern, e))?;

        Ok(Self {
            pattern: pattern.to_string(),
            globs: Some(globs),
        })
    }

    /// Filter that accepts every file name
    pub fn any() -> Self {
        Self {
            pattern: "*".to_string(),
            globs: None,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check whether the file name of `path` matches
    pub fn matches(&self, path: &Path) -> bool {
        let Some(globs) = &self.globs else {
            return true;
        };

        match path.file_name() {
            Some(name) => globs.matched(Path::new(name), false).is_whitelist(),
            None => false,
        }
    }
}

fn invalid(pattern: &str, source: ignore::Error) -> WatchError {
    WatchError::InvalidFilter {
        pattern: pattern.to_string(),
        source,
    }
}
