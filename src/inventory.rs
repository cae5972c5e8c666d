//! Cloud inventory and snapshot API seams
//!
//! These traits are the ONLY sanctioned way the lifecycle engine talks to
//! the cloud backend. The orchestrator, creator, and pruner are written
//! against them, which keeps the policy logic testable with an in-memory
//! fake and confines all transport concerns to one adapter.
//!
//! # Contract
//!
//! - Inventory reads are side-effect free and always reflect live state;
//!   callers must not cache results across phases of a run.
//! - Transport or auth failures surface as `SnapError::Inventory` (or the
//!   operation-specific variant for snapshot list/create/delete) and are
//!   not retried within a run.
//! - Implementations must be shareable across worker threads.

use crate::error::Result;
use crate::types::{Disk, Instance, Snapshot};

/// Read-only access to disks, instances, zones, and snapshots.
pub trait InventoryClient: Send + Sync {
    /// Lists every disk in the project, attached or not.
    fn list_all_disks(&self) -> Result<Vec<Disk>>;

    /// Lists all instances that are not terminated, with their attachments.
    fn list_live_instances(&self) -> Result<Vec<Instance>>;

    /// Fetches one instance's current status and attachments.
    ///
    /// # Errors
    ///
    /// - `SnapError::InstanceNotFound` when the instance does not exist.
    fn describe_instance(&self, name: &str, zone: &str) -> Result<Instance>;

    /// Whether the named zone exists.
    fn zone_exists(&self, zone: &str) -> Result<bool>;

    /// Lists snapshots whose source is the given disk.
    ///
    /// Implementations should push the tool's naming prefix into a
    /// server-side filter where the backend supports it; the pruner
    /// re-applies the prefix filter client-side regardless.
    ///
    /// # Errors
    ///
    /// - `SnapError::SnapshotListFailed` when the query fails.
    fn list_snapshots_for_disk(&self, disk: &Disk, prefix: &str) -> Result<Vec<Snapshot>>;
}

/// Mutating snapshot operations.
pub trait SnapshotApi: Send + Sync {
    /// Creates a snapshot of the disk under the given name.
    ///
    /// On success exactly one new snapshot exists; on failure none does
    /// (the backend's create call is all-or-nothing).
    ///
    /// # Errors
    ///
    /// - `SnapError::SnapshotCreateFailed` on any API error.
    fn create_snapshot(&self, disk: &Disk, snapshot_name: &str) -> Result<()>;

    /// Deletes one snapshot by name.
    ///
    /// # Errors
    ///
    /// - `SnapError::SnapshotDeleteFailed` on any API error.
    fn delete_snapshot(&self, snapshot_name: &str) -> Result<()>;
}
