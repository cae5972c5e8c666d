//! Retention pruning
//!
//! Deletes snapshots of a disk that are strictly older than the retention
//! cutoff AND carry the tool's ownership prefix. The prefix guard is a hard
//! invariant: this tool must never delete a snapshot it did not create, no
//! matter how old it looks. An earlier shell-script ancestor of this tool
//! matched on age alone and deleted operator-made snapshots; the selection
//! logic here is tested against exactly that regression.
//!
//! Deletion is best-effort: one failed delete does not stop the remaining
//! deletes for the disk, and all failures are aggregated into the outcome.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{Result, SnapError};
use crate::inventory::{InventoryClient, SnapshotApi};
use crate::types::{Disk, Snapshot};

/// What pruning one disk accomplished.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Names of snapshots successfully deleted.
    pub deleted: Vec<String>,
    /// Individual delete failures; the run continues past these.
    pub failures: Vec<SnapError>,
}

impl PruneOutcome {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Select the snapshots eligible for deletion.
///
/// A snapshot qualifies only when its name starts with `{prefix}-` and its
/// creation timestamp is strictly before the cutoff.
pub fn select_expired<'a>(
    snapshots: &'a [Snapshot],
    prefix: &str,
    cutoff: DateTime<Utc>,
) -> Vec<&'a Snapshot> {
    let marker = format!("{prefix}-");
    snapshots
        .iter()
        .filter(|s| s.name.starts_with(&marker) && s.created < cutoff)
        .collect()
}

/// Prune one disk's expired snapshots.
///
/// Fails only when the snapshot list itself cannot be fetched; individual
/// delete failures land in the outcome instead.
pub fn prune_disk(
    inventory: &dyn InventoryClient,
    api: &dyn SnapshotApi,
    settings: &Settings,
    disk: &Disk,
    cutoff: DateTime<Utc>,
    dry_run: bool,
) -> Result<PruneOutcome> {
    let snapshots = inventory.list_snapshots_for_disk(disk, &settings.prefix)?;
    let expired = select_expired(&snapshots, &settings.prefix, cutoff);
    if expired.is_empty() {
        info!(disk = %disk.name, "no expired snapshots to prune");
        return Ok(PruneOutcome::default());
    }

    let mut outcome = PruneOutcome::default();
    for snapshot in expired {
        if dry_run {
            info!(
                disk = %disk.name,
                snapshot = %snapshot.name,
                created = %snapshot.created,
                "dry-run: would delete expired snapshot"
            );
            outcome.deleted.push(snapshot.name.clone());
            continue;
        }
        match api.delete_snapshot(&snapshot.name) {
            Ok(()) => {
                info!(disk = %disk.name, snapshot = %snapshot.name, "deleted expired snapshot");
                outcome.deleted.push(snapshot.name.clone());
            }
            Err(err) => {
                warn!(disk = %disk.name, snapshot = %snapshot.name, %err, "delete failed");
                outcome.failures.push(err);
            }
        }
    }
    Ok(outcome)
}
