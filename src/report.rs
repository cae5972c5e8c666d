//! Per-disk run outcomes
//!
//! The mutation phase produces one `DiskReport` per disk, filled in by
//! whichever worker handled that disk and merged here. Partial-batch
//! failures keep their per-disk detail; the run-level exit code is derived
//! from the worst failure class present.

use crate::error::SnapError;

/// Outcome of the create/prune job for one disk.
#[derive(Debug)]
pub struct DiskReport {
    pub disk: String,
    /// Name of the snapshot created for this disk, if creation succeeded
    /// (or would have, in dry-run).
    pub created: Option<String>,
    /// Names of expired snapshots deleted for this disk.
    pub deleted: Vec<String>,
    /// Everything that went wrong for this disk; empty means success.
    pub errors: Vec<SnapError>,
}

impl DiskReport {
    pub fn new(disk: impl Into<String>) -> Self {
        Self {
            disk: disk.into(),
            created: None,
            deleted: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregated result of one run's mutation phase.
#[derive(Debug, Default)]
pub struct RunReport {
    pub disks: Vec<DiskReport>,
}

impl RunReport {
    /// Returns true if every disk completed without failures.
    pub fn is_ok(&self) -> bool {
        self.disks.iter().all(DiskReport::is_ok)
    }

    pub fn snapshots_created(&self) -> usize {
        self.disks.iter().filter(|d| d.created.is_some()).count()
    }

    pub fn snapshots_deleted(&self) -> usize {
        self.disks.iter().map(|d| d.deleted.len()).sum()
    }

    /// All per-disk failures, in disk order.
    pub fn errors(&self) -> impl Iterator<Item = &SnapError> {
        self.disks.iter().flat_map(|d| d.errors.iter())
    }

    /// Exit code for the run: 0 when clean, otherwise the code of the most
    /// severe failure class present (create > list > delete), so exactly
    /// one nonzero code is reported even for mixed partial failures.
    pub fn exit_code(&self) -> i32 {
        self.errors().map(|e| e.exit_code()).min().unwrap_or(0)
    }
}
