use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, SnapError};
use crate::types::{RunMode, RunRequest};

/// disksnap - snapshot lifecycle manager for cloud block-storage disks
#[derive(Parser, Debug)]
#[command(name = "disksnap")]
#[command(about = "Creates point-in-time snapshots of cloud disks and prunes expired ones")]
#[command(version)]
pub struct Cli {
    /// Snapshot all disks in the project (mutually exclusive with -m)
    #[arg(short = 'a', long = "all-disks")]
    pub all_disks: bool,

    /// Snapshot the disks of one instance (requires -z)
    #[arg(short = 'm', long = "machine", value_name = "NAME")]
    pub machine: Option<String>,

    /// Zone of the instance given with -m
    #[arg(short = 'z', long = "zone", value_name = "ZONE")]
    pub zone: Option<String>,

    /// Delete snapshots created by this tool that are older than the
    /// retention cutoff, after creating the new ones
    #[arg(short = 'd', long = "delete-expired")]
    pub delete_expired: bool,

    /// Retention window in days used to compute the cutoff
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<u32>,

    /// Number of worker threads for the per-disk create/prune phase
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Path to a JSON settings file (prefix, truncation, retention, jobs)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// In this mode, mutating operations (snapshot create/delete) are
    /// skipped and logged. Read-only inventory queries still execute so
    /// the preview is realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Resolve the flag surface into an immutable `RunRequest`.
    ///
    /// Exactly one of `-a` / `-m` must be selected; `-m` requires `-z`;
    /// `-z` alongside `-a` is ignored with a warning.
    pub fn to_run_request(&self) -> Result<RunRequest> {
        let mode = match (self.all_disks, &self.machine) {
            (true, Some(_)) => {
                return Err(SnapError::config(
                    "-a and -m are mutually exclusive; pick one run mode",
                ));
            }
            (true, None) => {
                if self.zone.is_some() {
                    tracing::warn!("-z has no effect with -a; ignoring it");
                }
                RunMode::AllDisks
            }
            (false, Some(instance)) => {
                let zone = self
                    .zone
                    .clone()
                    .ok_or_else(|| SnapError::config("-m requires -z ZONE"))?;
                RunMode::SingleInstance {
                    instance: instance.clone(),
                    zone,
                }
            }
            (false, None) => {
                return Err(SnapError::config(
                    "nothing to do: pass -a for all disks or -m NAME -z ZONE for one instance",
                ));
            }
        };

        Ok(RunRequest {
            mode,
            prune_expired: self.delete_expired,
            dry_run: self.dry_run,
        })
    }
}
