//! Domain types for the snapshot lifecycle engine
//!
//! This module replaces stringly-typed cloud resource handling with proper
//! Rust enums and structs that provide compile-time validation and
//! exhaustive matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How a disk is attached to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum AccessMode {
    #[strum(serialize = "READ_ONLY")]
    #[serde(rename = "READ_ONLY")]
    ReadOnly,
    #[strum(serialize = "READ_WRITE")]
    #[serde(rename = "READ_WRITE")]
    ReadWrite,
}

/// Power state of an instance, as reported by the backend.
///
/// Only `Terminated` makes a read-write attachment safe to snapshot; every
/// other state (including transitional ones) is treated as live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    Provisioning,
    Staging,
    Running,
    Stopping,
    Suspending,
    Suspended,
    Terminated,
}

impl PowerState {
    /// A terminated instance cannot mutate its disks mid-copy.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Terminated)
    }
}

/// A block-storage disk, identified by name and zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub name: String,
    pub zone: String,
}

impl Disk {
    pub fn new(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
        }
    }
}

/// One disk attachment of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub disk_name: String,
    pub mode: AccessMode,
}

/// An instance together with its power state and attached disks.
///
/// Always re-read fresh from the inventory before acting on it; power state
/// and attachment modes can change between enumeration and action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub zone: String,
    pub status: PowerState,
    pub attachments: Vec<Attachment>,
}

/// A point-in-time snapshot of a disk as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub source_disk: String,
    pub created: DateTime<Utc>,
}

/// Which resources a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Snapshot every disk in the project, attached or not.
    AllDisks,
    /// Snapshot the disks of one named instance.
    SingleInstance { instance: String, zone: String },
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllDisks => write!(f, "all-disks"),
            Self::SingleInstance { instance, zone } => {
                write!(f, "single-instance {instance} ({zone})")
            }
        }
    }
}

/// The resolved operation for one invocation. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: RunMode,
    /// When set, snapshots older than the retention cutoff are pruned after
    /// creation.
    pub prune_expired: bool,
    /// Dry-run: log mutating calls instead of issuing them.
    pub dry_run: bool,
}
