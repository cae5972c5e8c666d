//! Snapshot creation and deterministic naming
//!
//! Names follow `{prefix}-{disk[..truncate_len]}-{YYYYMMDD-HHMMSS}` (UTC).
//! The prefix is the ownership marker the pruner greps for; the truncation
//! keeps long disk names inside the platform's 63-char resource-name limit.
//! Each run snapshots a given disk at most once, so second resolution is
//! enough to keep names unique within a run.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::inventory::SnapshotApi;
use crate::types::Disk;

/// Compute the snapshot name for a disk at the given instant.
pub fn snapshot_name(settings: &Settings, disk_name: &str, at: DateTime<Utc>) -> String {
    let short: String = disk_name.chars().take(settings.truncate_len).collect();
    format!("{}-{}-{}", settings.prefix, short, at.format("%Y%m%d-%H%M%S"))
}

/// Create one snapshot of the disk, returning the name it was given.
///
/// In dry-run mode the create call is logged and skipped; the name that
/// would have been used is still returned so the report reads the same.
pub fn create_snapshot(
    api: &dyn SnapshotApi,
    settings: &Settings,
    disk: &Disk,
    at: DateTime<Utc>,
    dry_run: bool,
) -> Result<String> {
    let name = snapshot_name(settings, &disk.name, at);
    if dry_run {
        info!(disk = %disk.name, snapshot = %name, "dry-run: would create snapshot");
        return Ok(name);
    }
    api.create_snapshot(disk, &name)?;
    info!(disk = %disk.name, snapshot = %name, "created snapshot");
    Ok(name)
}
