//! disksnap library
//!
//! Snapshot lifecycle management for cloud block-storage disks: creates
//! point-in-time snapshots (whole project or one instance), refuses to
//! snapshot disks writable by a live machine, and prunes its own expired
//! snapshots past a retention window.

pub mod cli;
pub mod config;
pub mod creator;
pub mod error;
pub mod gcloud;
pub mod inventory;
pub mod orchestrator;
pub mod pruner;
pub mod report;
pub mod types;
pub mod validator;

// Re-export main types for convenience
pub use cli::Cli;
pub use config::Settings;
pub use error::{Result, SnapError};
pub use gcloud::GcloudCli;
pub use inventory::{InventoryClient, SnapshotApi};
pub use orchestrator::Orchestrator;
pub use pruner::PruneOutcome;
pub use report::{DiskReport, RunReport};
pub use types::{
    AccessMode, Attachment, Disk, Instance, PowerState, RunMode, RunRequest, Snapshot,
};
