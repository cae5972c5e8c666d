//! Runtime settings: snapshot naming and retention knobs
//!
//! Settings come from three layers, later layers winning: built-in defaults,
//! an optional JSON settings file (`--config`), and individual CLI flags.
//! The prefix and truncation length are settings rather than constants so
//! that platform name-limit changes are a config edit, not a code change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;
use crate::error::{Result, SnapError};

/// Ownership marker prepended to every snapshot this tool creates.
///
/// The pruner only ever considers snapshots carrying this prefix, so it can
/// never delete a snapshot made by another tool or a human.
pub const DEFAULT_PREFIX: &str = "autosnap";

/// Characters of the source disk name kept in the snapshot name.
///
/// With the default prefix (8 + 1) and the 16-char timestamp suffix the
/// worst-case name is 56 characters, inside the platform's 63-char limit.
pub const DEFAULT_TRUNCATE_LEN: usize = 31;

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Default worker-thread count for the per-disk mutation phase.
pub const DEFAULT_JOBS: usize = 4;

/// Resolved settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Snapshot name prefix, also the pruner's ownership filter.
    pub prefix: String,
    /// Max characters of the disk name embedded in a snapshot name.
    pub truncate_len: usize,
    /// Snapshots older than this many days are eligible for pruning.
    pub retention_days: u32,
    /// Worker threads for the create/prune phase.
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            truncate_len: DEFAULT_TRUNCATE_LEN,
            retention_days: DEFAULT_RETENTION_DAYS,
            jobs: DEFAULT_JOBS,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Build the effective settings for a run: defaults, then the optional
    /// settings file, then flag overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        if let Some(days) = cli.retention_days {
            settings.retention_days = days;
        }
        if let Some(jobs) = cli.jobs {
            settings.jobs = jobs;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would produce unusable snapshot names or a
    /// stalled worker pool.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(SnapError::config(
                "snapshot prefix must not be empty; the pruner relies on it",
            ));
        }
        if !self
            .prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SnapError::config(format!(
                "snapshot prefix {:?} must be lowercase alphanumeric or '-'",
                self.prefix
            )));
        }
        if self.truncate_len == 0 {
            return Err(SnapError::config("truncate_len must be at least 1"));
        }
        // prefix + '-' + disk + '-' + "YYYYMMDD-HHMMSS"
        let worst_case = self.prefix.len() + 1 + self.truncate_len + 1 + 15;
        if worst_case > 63 {
            return Err(SnapError::config(format!(
                "prefix plus truncate_len would allow {worst_case}-char names; \
                 the platform limit is 63"
            )));
        }
        if self.retention_days == 0 {
            return Err(SnapError::config(
                "retention_days must be at least 1; a zero-day window would \
                 prune snapshots from the current run",
            ));
        }
        if self.jobs == 0 {
            return Err(SnapError::config("jobs must be at least 1"));
        }
        Ok(())
    }
}
