//! Lifecycle orchestration — the "brain" that turns a `RunRequest` into
//! snapshot create and prune calls.
//!
//! A run has two strictly ordered phases:
//!
//! 1. **Resolve + validate** (read-only, sequential): enumerate the target
//!    disks and run the RW-safety validator. Any validation failure aborts
//!    the run here, before a single mutation is issued.
//! 2. **Mutate** (bounded worker pool): one job per disk performs
//!    create-then-optionally-prune. Per-disk ordering is guaranteed by the
//!    job structure; across disks there is no ordering. Failures in this
//!    phase are per-disk and never abort sibling disks.
//!
//! Workers send `(index, DiskReport)` pairs over a channel into one slot
//! per disk; there is no shared mutable counter anywhere in the pool.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{Result, SnapError};
use crate::inventory::{InventoryClient, SnapshotApi};
use crate::report::{DiskReport, RunReport};
use crate::types::{Disk, RunMode, RunRequest};
use crate::{creator, pruner, validator};

pub struct Orchestrator<'a> {
    inventory: &'a dyn InventoryClient,
    api: &'a dyn SnapshotApi,
    settings: &'a Settings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        inventory: &'a dyn InventoryClient,
        api: &'a dyn SnapshotApi,
        settings: &'a Settings,
    ) -> Self {
        Self {
            inventory,
            api,
            settings,
        }
    }

    /// Execute one run.
    ///
    /// Returns `Err` for fatal failures in the resolve/validate phase
    /// (bad zone, missing instance, unsafe disk, inventory outage); returns
    /// `Ok(report)` once the mutation phase ran, with per-disk failures
    /// recorded in the report.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        info!(mode = %request.mode, dry_run = request.dry_run, "starting run");
        let disks = match &request.mode {
            RunMode::SingleInstance { instance, zone } => {
                self.resolve_single_instance(instance, zone)?
            }
            RunMode::AllDisks => self.resolve_all_disks()?,
        };
        info!(disks = disks.len(), "validation passed, entering mutation phase");
        Ok(self.mutate_disks(disks, request))
    }

    /// SINGLE_INSTANCE resolve phase: zone, instance, then RW-safety over
    /// the instance's full disk set. Fail-fast: an instance's disks are
    /// snapshotted all together or not at all.
    fn resolve_single_instance(&self, name: &str, zone: &str) -> Result<Vec<Disk>> {
        if !self.inventory.zone_exists(zone)? {
            return Err(SnapError::ZoneNotFound(zone.to_string()));
        }
        let instance = self.inventory.describe_instance(name, zone)?;
        validator::validate_instance(&instance)?;
        Ok(instance
            .attachments
            .iter()
            .map(|a| Disk::new(a.disk_name.clone(), zone))
            .collect())
    }

    /// ALL_DISKS resolve phase: every disk in the project (attached or
    /// not), gated on a validator pass over every live instance. One
    /// unsafe instance aborts the whole project run; a project-wide backup
    /// that silently skipped disks would not be a backup.
    fn resolve_all_disks(&self) -> Result<Vec<Disk>> {
        let disks = self.inventory.list_all_disks()?;
        for instance in self.inventory.list_live_instances()? {
            debug!(instance = %instance.name, status = %instance.status, "checking instance");
            validator::validate_instance(&instance)?;
        }
        Ok(disks)
    }

    /// Mutation phase: bounded worker pool, one create-then-prune job per
    /// disk, results merged by disk index.
    fn mutate_disks(&self, disks: Vec<Disk>, request: &RunRequest) -> RunReport {
        if disks.is_empty() {
            return RunReport::default();
        }
        let started_at = Utc::now();
        let cutoff = started_at - Duration::days(i64::from(self.settings.retention_days));
        let jobs = self.settings.jobs.min(disks.len());

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, DiskReport)>();

        thread::scope(|s| {
            for _ in 0..jobs {
                let tx = tx.clone();
                let next = &next;
                let disks = &disks;
                s.spawn(move || {
                    loop {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        if i >= disks.len() {
                            break;
                        }
                        let report = self.process_disk(&disks[i], request, started_at, cutoff);
                        if tx.send((i, report)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<DiskReport>> = disks.iter().map(|_| None).collect();
        for (i, report) in rx {
            slots[i] = Some(report);
        }
        RunReport {
            disks: slots.into_iter().flatten().collect(),
        }
    }

    /// One disk's job: create, then prune if retention is enabled.
    ///
    /// A failed create abandons the disk (no pruning against a disk whose
    /// backup did not land), but siblings keep going.
    fn process_disk(
        &self,
        disk: &Disk,
        request: &RunRequest,
        started_at: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> DiskReport {
        let mut report = DiskReport::new(&disk.name);
        match creator::create_snapshot(self.api, self.settings, disk, started_at, request.dry_run)
        {
            Ok(name) => report.created = Some(name),
            Err(err) => {
                report.errors.push(err);
                return report;
            }
        }
        if request.prune_expired {
            match pruner::prune_disk(
                self.inventory,
                self.api,
                self.settings,
                disk,
                cutoff,
                request.dry_run,
            ) {
                Ok(outcome) => {
                    report.deleted = outcome.deleted;
                    report.errors.extend(outcome.failures);
                }
                Err(err) => report.errors.push(err),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessMode, Attachment, Instance, PowerState, Snapshot};
    use std::sync::Mutex;

    /// Records backend calls so tests can assert phase ordering.
    #[derive(Default)]
    struct RecordingCloud {
        disks: Vec<Disk>,
        instances: Vec<Instance>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingCloud {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl InventoryClient for RecordingCloud {
        fn list_all_disks(&self) -> crate::error::Result<Vec<Disk>> {
            self.log("list_all_disks");
            Ok(self.disks.clone())
        }

        fn list_live_instances(&self) -> crate::error::Result<Vec<Instance>> {
            self.log("list_live_instances");
            Ok(self
                .instances
                .iter()
                .filter(|i| i.status.is_live())
                .cloned()
                .collect())
        }

        fn describe_instance(&self, name: &str, zone: &str) -> crate::error::Result<Instance> {
            self.log(format!("describe_instance {name}"));
            self.instances
                .iter()
                .find(|i| i.name == name && i.zone == zone)
                .cloned()
                .ok_or_else(|| SnapError::InstanceNotFound {
                    instance: name.to_string(),
                    zone: zone.to_string(),
                })
        }

        fn zone_exists(&self, zone: &str) -> crate::error::Result<bool> {
            self.log(format!("zone_exists {zone}"));
            Ok(zone == "us-east1-b")
        }

        fn list_snapshots_for_disk(
            &self,
            disk: &Disk,
            _prefix: &str,
        ) -> crate::error::Result<Vec<Snapshot>> {
            self.log(format!("list_snapshots {}", disk.name));
            Ok(Vec::new())
        }
    }

    impl SnapshotApi for RecordingCloud {
        fn create_snapshot(&self, disk: &Disk, name: &str) -> crate::error::Result<()> {
            self.log(format!("create {} {name}", disk.name));
            Ok(())
        }

        fn delete_snapshot(&self, name: &str) -> crate::error::Result<()> {
            self.log(format!("delete {name}"));
            Ok(())
        }
    }

    fn request(mode: RunMode) -> RunRequest {
        RunRequest {
            mode,
            prune_expired: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_unknown_zone_aborts_before_describe() {
        let cloud = RecordingCloud::default();
        let settings = Settings::default();
        let orchestrator = Orchestrator::new(&cloud, &cloud, &settings);
        let err = orchestrator
            .run(&request(RunMode::SingleInstance {
                instance: "web-1".into(),
                zone: "nowhere-1-x".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, SnapError::ZoneNotFound(_)));
        let calls = cloud.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["zone_exists nowhere-1-x"]);
    }

    #[test]
    fn test_unsafe_instance_blocks_all_mutations() {
        let cloud = RecordingCloud {
            disks: vec![Disk::new("a", "us-east1-b"), Disk::new("b", "us-east1-b")],
            instances: vec![Instance {
                name: "web-1".into(),
                zone: "us-east1-b".into(),
                status: PowerState::Running,
                attachments: vec![Attachment {
                    disk_name: "a".into(),
                    mode: AccessMode::ReadWrite,
                }],
            }],
            ..RecordingCloud::default()
        };
        let settings = Settings::default();
        let orchestrator = Orchestrator::new(&cloud, &cloud, &settings);
        let err = orchestrator.run(&request(RunMode::AllDisks)).unwrap_err();
        assert!(matches!(err, SnapError::UnsafeDisk { .. }));
        let calls = cloud.calls.lock().unwrap();
        assert!(
            calls.iter().all(|c| !c.starts_with("create")),
            "no snapshot may be created after a failed validation: {calls:?}"
        );
    }

    #[test]
    fn test_validation_completes_before_first_create() {
        let cloud = RecordingCloud {
            disks: vec![Disk::new("a", "us-east1-b")],
            instances: vec![Instance {
                name: "idle".into(),
                zone: "us-east1-b".into(),
                status: PowerState::Running,
                attachments: vec![Attachment {
                    disk_name: "a".into(),
                    mode: AccessMode::ReadOnly,
                }],
            }],
            ..RecordingCloud::default()
        };
        let settings = Settings::default();
        let orchestrator = Orchestrator::new(&cloud, &cloud, &settings);
        let report = orchestrator.run(&request(RunMode::AllDisks)).unwrap();
        assert!(report.is_ok());

        let calls = cloud.calls.lock().unwrap();
        let first_create = calls.iter().position(|c| c.starts_with("create")).unwrap();
        let inventory_pass = calls
            .iter()
            .position(|c| c == "list_live_instances")
            .unwrap();
        assert!(inventory_pass < first_create);
    }

    #[test]
    fn test_single_instance_snapshots_each_attachment() {
        let cloud = RecordingCloud {
            instances: vec![Instance {
                name: "db".into(),
                zone: "us-east1-b".into(),
                status: PowerState::Terminated,
                attachments: vec![
                    Attachment {
                        disk_name: "db-root".into(),
                        mode: AccessMode::ReadWrite,
                    },
                    Attachment {
                        disk_name: "db-data".into(),
                        mode: AccessMode::ReadWrite,
                    },
                ],
            }],
            ..RecordingCloud::default()
        };
        let settings = Settings::default();
        let orchestrator = Orchestrator::new(&cloud, &cloud, &settings);
        let report = orchestrator
            .run(&request(RunMode::SingleInstance {
                instance: "db".into(),
                zone: "us-east1-b".into(),
            }))
            .unwrap();
        assert_eq!(report.snapshots_created(), 2);
        let names: Vec<&str> = report.disks.iter().map(|d| d.disk.as_str()).collect();
        assert!(names.contains(&"db-root") && names.contains(&"db-data"));
    }

    #[test]
    fn test_dry_run_issues_no_mutations() {
        let cloud = RecordingCloud {
            disks: vec![Disk::new("a", "us-east1-b")],
            ..RecordingCloud::default()
        };
        let settings = Settings::default();
        let orchestrator = Orchestrator::new(&cloud, &cloud, &settings);
        let report = orchestrator
            .run(&RunRequest {
                mode: RunMode::AllDisks,
                prune_expired: true,
                dry_run: true,
            })
            .unwrap();
        assert!(report.is_ok());
        assert_eq!(report.snapshots_created(), 1);
        let calls = cloud.calls.lock().unwrap();
        assert!(calls
            .iter()
            .all(|c| !c.starts_with("create") && !c.starts_with("delete")));
    }
}
