//! RW-safety validation
//!
//! A disk mounted read-write by a live machine may be mutated mid-copy,
//! producing a torn snapshot. Read-only attachments are exempt, and a
//! terminated instance cannot write at all.
//!
//! # Design
//!
//! - **Pure logic**: no I/O, no side effects — only inspects the instance
//!   value it is given.
//! - **All offenders reported**: the scan does not stop at the first
//!   read-write attachment, so the operator sees every disk they need to
//!   detach or power off in one pass.
//! - **Never memoized**: callers re-run this against a freshly described
//!   instance before every mutation phase; project-wide iteration may
//!   interleave with external changes to instance state.

use crate::error::{Result, SnapError};
use crate::types::Instance;

/// Check whether every disk of the instance is safe to snapshot.
///
/// Returns `SnapError::UnsafeDisk` naming the instance and all offending
/// disks when the instance is live and has at least one read-write
/// attachment.
pub fn validate_instance(instance: &Instance) -> Result<()> {
    if !instance.status.is_live() {
        return Ok(());
    }
    let offenders: Vec<String> = instance
        .attachments
        .iter()
        .filter(|a| a.mode == crate::types::AccessMode::ReadWrite)
        .map(|a| a.disk_name.clone())
        .collect();
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(SnapError::UnsafeDisk {
            instance: instance.name.clone(),
            disks: offenders,
        })
    }
}
