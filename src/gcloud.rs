//! gcloud.rs - Production backend over the `gcloud compute` CLI.
//!
//! Every inventory query and snapshot mutation shells out to `gcloud` with
//! `--format=json` and parses the payload with serde. Keeping the adapter
//! behind the `InventoryClient`/`SnapshotApi` traits means the lifecycle
//! engine never sees a process boundary.
//!
//! Resource URLs (zones, source disks) are reduced to their last path
//! segment; that is the form the rest of the engine works with.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::process::Command;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Result, SnapError};
use crate::inventory::{InventoryClient, SnapshotApi};
use crate::types::{AccessMode, Attachment, Disk, Instance, PowerState, Snapshot};

/// Backend adapter that shells out to the `gcloud` CLI.
pub struct GcloudCli {
    binary: String,
}

impl GcloudCli {
    /// Create an adapter using `gcloud` from PATH.
    ///
    /// Fails up front if the binary is not available, so a misconfigured
    /// host is reported before any run logic starts.
    pub fn new() -> Result<Self> {
        Self::with_binary("gcloud")
    }

    /// Create an adapter using an explicit binary (used by tests to point
    /// at a fake).
    pub fn with_binary(binary: impl Into<String>) -> Result<Self> {
        let binary = binary.into();
        if !binary_exists(&binary) {
            return Err(SnapError::inventory(format!(
                "required binary not found in PATH: {binary}"
            )));
        }
        Ok(Self { binary })
    }

    /// Run one gcloud invocation and return stdout on success.
    fn run(&self, args: &[&str]) -> std::result::Result<String, String> {
        debug!(binary = %self.binary, ?args, "invoking backend CLI");
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| e.to_string())
            .and_then(|output| {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    Err(String::from_utf8_lossy(&output.stderr).to_string())
                }
            })
    }
}

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    // An absolute or relative path is probed directly; bare names go
    // through `which`.
    if name.contains('/') {
        return std::path::Path::new(name).exists();
    }
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Last path segment of a resource URL (`.../zones/us-east1-b` -> `us-east1-b`).
fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

// ============================================================================
// JSON payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct DiskRow {
    name: String,
    zone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachedDiskRow {
    source: Option<String>,
    device_name: Option<String>,
    mode: String,
}

#[derive(Debug, Deserialize)]
struct InstanceRow {
    name: String,
    zone: String,
    status: String,
    #[serde(default)]
    disks: Vec<AttachedDiskRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRow {
    name: String,
    creation_timestamp: String,
    source_disk: String,
}

pub(crate) fn parse_disk_list(json: &str) -> Result<Vec<Disk>> {
    let rows: Vec<DiskRow> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(|row| Disk::new(row.name, last_segment(&row.zone).to_string()))
        .collect())
}

fn parse_instance_row(row: InstanceRow) -> Result<Instance> {
    let status = PowerState::from_str(&row.status).map_err(|_| {
        SnapError::inventory(format!(
            "instance {} reports unknown status {:?}",
            row.name, row.status
        ))
    })?;
    let attachments = row
        .disks
        .into_iter()
        .map(|d| {
            let disk_name = d
                .source
                .as_deref()
                .map(|s| last_segment(s).to_string())
                .or(d.device_name)
                .ok_or_else(|| {
                    SnapError::inventory("attached disk entry has neither source nor deviceName")
                })?;
            let mode = AccessMode::from_str(&d.mode).map_err(|_| {
                SnapError::inventory(format!(
                    "attachment {disk_name} reports unknown access mode {:?}",
                    d.mode
                ))
            })?;
            Ok(Attachment { disk_name, mode })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Instance {
        name: row.name,
        zone: last_segment(&row.zone).to_string(),
        status,
        attachments,
    })
}

pub(crate) fn parse_instance_list(json: &str) -> Result<Vec<Instance>> {
    let rows: Vec<InstanceRow> = serde_json::from_str(json)?;
    rows.into_iter().map(parse_instance_row).collect()
}

pub(crate) fn parse_instance(json: &str) -> Result<Instance> {
    let row: InstanceRow = serde_json::from_str(json)?;
    parse_instance_row(row)
}

pub(crate) fn parse_snapshot_list(json: &str) -> Result<Vec<Snapshot>> {
    let rows: Vec<SnapshotRow> = serde_json::from_str(json)?;
    rows.into_iter()
        .map(|row| {
            let created = DateTime::parse_from_rfc3339(&row.creation_timestamp)
                .map_err(|e| {
                    SnapError::inventory(format!(
                        "snapshot {} has unparseable creationTimestamp {:?}: {e}",
                        row.name, row.creation_timestamp
                    ))
                })?
                .with_timezone(&Utc);
            Ok(Snapshot {
                name: row.name,
                source_disk: last_segment(&row.source_disk).to_string(),
                created,
            })
        })
        .collect()
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("was not found") || lower.contains("not found:")
}

// ============================================================================
// Trait implementations
// ============================================================================

impl InventoryClient for GcloudCli {
    fn list_all_disks(&self) -> Result<Vec<Disk>> {
        let out = self
            .run(&["compute", "disks", "list", "--format=json"])
            .map_err(SnapError::inventory)?;
        parse_disk_list(&out)
    }

    fn list_live_instances(&self) -> Result<Vec<Instance>> {
        let out = self
            .run(&[
                "compute",
                "instances",
                "list",
                "--filter=status!=TERMINATED",
                "--format=json",
            ])
            .map_err(SnapError::inventory)?;
        parse_instance_list(&out)
    }

    fn describe_instance(&self, name: &str, zone: &str) -> Result<Instance> {
        let out = self
            .run(&[
                "compute",
                "instances",
                "describe",
                name,
                "--zone",
                zone,
                "--format=json",
            ])
            .map_err(|stderr| {
                if is_not_found(&stderr) {
                    SnapError::InstanceNotFound {
                        instance: name.to_string(),
                        zone: zone.to_string(),
                    }
                } else {
                    SnapError::inventory(stderr)
                }
            })?;
        parse_instance(&out)
    }

    fn zone_exists(&self, zone: &str) -> Result<bool> {
        match self.run(&["compute", "zones", "describe", zone, "--format=json"]) {
            Ok(_) => Ok(true),
            Err(stderr) if is_not_found(&stderr) => Ok(false),
            Err(stderr) => Err(SnapError::inventory(stderr)),
        }
    }

    fn list_snapshots_for_disk(&self, disk: &Disk, prefix: &str) -> Result<Vec<Snapshot>> {
        // Server-side filter on both ownership prefix and source disk; the
        // pruner re-checks both client-side.
        let filter = format!("name~^{prefix}- AND sourceDisk~/{}$", disk.name);
        let out = self
            .run(&[
                "compute",
                "snapshots",
                "list",
                &format!("--filter={filter}"),
                "--format=json",
            ])
            .map_err(|stderr| SnapError::SnapshotListFailed {
                disk: disk.name.clone(),
                cause: stderr,
            })?;
        parse_snapshot_list(&out)
    }
}

impl SnapshotApi for GcloudCli {
    fn create_snapshot(&self, disk: &Disk, snapshot_name: &str) -> Result<()> {
        self.run(&[
            "compute",
            "disks",
            "snapshot",
            &disk.name,
            "--zone",
            &disk.zone,
            "--snapshot-names",
            snapshot_name,
        ])
        .map(|_| ())
        .map_err(|stderr| SnapError::SnapshotCreateFailed {
            disk: disk.name.clone(),
            cause: stderr,
        })
    }

    fn delete_snapshot(&self, snapshot_name: &str) -> Result<()> {
        self.run(&["compute", "snapshots", "delete", snapshot_name, "--quiet"])
            .map(|_| ())
            .map_err(|stderr| SnapError::SnapshotDeleteFailed {
                snapshot: snapshot_name.to_string(),
                cause: stderr,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment("https://compute/v1/projects/p/zones/us-east1-b"),
            "us-east1-b"
        );
        assert_eq!(last_segment("plain-name"), "plain-name");
    }

    #[test]
    fn test_parse_disk_list() {
        let json = r#"[
            {"name": "db-1", "zone": "https://compute/v1/projects/p/zones/us-east1-b"},
            {"name": "web-data", "zone": "us-central1-a"}
        ]"#;
        let disks = parse_disk_list(json).unwrap();
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0], Disk::new("db-1", "us-east1-b"));
        assert_eq!(disks[1].zone, "us-central1-a");
    }

    #[test]
    fn test_parse_instance_with_attachments() {
        let json = r#"{
            "name": "web-1",
            "zone": "https://compute/v1/projects/p/zones/us-east1-b",
            "status": "RUNNING",
            "disks": [
                {"source": "https://compute/v1/projects/p/zones/us-east1-b/disks/db-1",
                 "deviceName": "persistent-disk-0", "mode": "READ_WRITE"},
                {"deviceName": "scratch", "mode": "READ_ONLY"}
            ]
        }"#;
        let instance = parse_instance(json).unwrap();
        assert_eq!(instance.status, PowerState::Running);
        assert_eq!(instance.zone, "us-east1-b");
        assert_eq!(instance.attachments.len(), 2);
        assert_eq!(instance.attachments[0].disk_name, "db-1");
        assert_eq!(instance.attachments[0].mode, AccessMode::ReadWrite);
        // deviceName is the fallback when no source URL is present
        assert_eq!(instance.attachments[1].disk_name, "scratch");
    }

    #[test]
    fn test_parse_instance_unknown_status_is_inventory_error() {
        let json = r#"{"name": "x", "zone": "z", "status": "EXPLODED", "disks": []}"#;
        assert!(matches!(
            parse_instance(json).unwrap_err(),
            SnapError::Inventory(_)
        ));
    }

    #[test]
    fn test_parse_snapshot_list() {
        let json = r#"[
            {"name": "autosnap-db-1-20240101-000000",
             "creationTimestamp": "2024-01-01T00:00:00.000-08:00",
             "sourceDisk": "https://compute/v1/projects/p/zones/us-east1-b/disks/db-1"}
        ]"#;
        let snaps = parse_snapshot_list(json).unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].source_disk, "db-1");
        assert_eq!(snaps[0].created.to_rfc3339(), "2024-01-01T08:00:00+00:00");
    }

    #[test]
    fn test_parse_snapshot_bad_timestamp() {
        let json = r#"[{"name": "s", "creationTimestamp": "yesterday", "sourceDisk": "d"}]"#;
        assert!(parse_snapshot_list(json).is_err());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found(
            "ERROR: (gcloud.compute.instances.describe) Could not fetch resource:\n \
             - The resource 'projects/p/zones/z/instances/i' was not found"
        ));
        assert!(!is_not_found("ERROR: quota exceeded"));
    }

    #[test]
    fn test_missing_binary_is_inventory_error() {
        let err = GcloudCli::with_binary("this_binary_definitely_does_not_exist_12345")
            .err()
            .unwrap();
        assert!(matches!(err, SnapError::Inventory(_)));
    }
}
