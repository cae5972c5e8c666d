//! Error handling module for disksnap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure class maps to exactly one process exit code so that
//! schedulers wrapping this tool can dispatch on the result.

use thiserror::Error;

/// Main error type for disksnap
#[derive(Error, Debug)]
pub enum SnapError {
    /// Invalid or conflicting command-line flags / settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// The named zone does not exist
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The named instance does not exist in the given zone
    #[error("Instance not found: {instance} in zone {zone}")]
    InstanceNotFound { instance: String, zone: String },

    /// A live instance has at least one disk attached read-write
    #[error(
        "Unsafe to snapshot: instance {instance} has disk(s) attached read-write \
         while not terminated: {}", .disks.join(", ")
    )]
    UnsafeDisk {
        instance: String,
        /// Every offending disk found on the instance, never empty.
        disks: Vec<String>,
    },

    /// Inventory query failed at the API layer (transport, auth, parse)
    #[error("Inventory query failed: {0}")]
    Inventory(String),

    /// Creating a snapshot for one disk failed
    #[error("Snapshot create failed for disk {disk}: {cause}")]
    SnapshotCreateFailed { disk: String, cause: String },

    /// Listing snapshots for a disk failed during pruning
    #[error("Snapshot list failed for disk {disk}: {cause}")]
    SnapshotListFailed { disk: String, cause: String },

    /// Deleting an expired snapshot failed
    #[error("Snapshot delete failed for {snapshot}: {cause}")]
    SnapshotDeleteFailed { snapshot: String, cause: String },

    /// JSON payloads from the backend that do not deserialize
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors (spawning the backend CLI, reading config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for disksnap operations
pub type Result<T> = std::result::Result<T, SnapError>;

impl SnapError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an inventory error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Self::Inventory(msg.into())
    }

    /// Map this error to the closed set of process exit codes.
    ///
    /// Exactly one nonzero code per run; partial-batch failures reuse the
    /// code of the failed operation class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ZoneNotFound(_) => 3,
            Self::InstanceNotFound { .. } => 4,
            Self::UnsafeDisk { .. } => 5,
            Self::Inventory(_) | Self::Json(_) | Self::Io(_) => 6,
            Self::SnapshotCreateFailed { .. } => 7,
            Self::SnapshotListFailed { .. } => 8,
            Self::SnapshotDeleteFailed { .. } => 9,
        }
    }
}
