//! Migration orchestrator: the per-record state machine and the batch loop.
//!
//! ```text
//! INSPECT → ZONE_CHECK → CAPACITY_CHECK → SNAPSHOT_ALL → DELETE_SOURCE
//!         → CREATE_TARGET → START_TARGET → DONE
//! ```
//!
//! Each record runs inside its own fault boundary: whatever happens, it ends
//! in a `RecordOutcome` and the batch moves on. Records run one at a time.

use chrono::Utc;
use tracing::Instrument;

use crate::application::ports::{ComputeProvider, RecoveryStore, VmInspector};
use crate::application::services::operation::PollSettings;
use crate::application::services::{capacity, inspector, recreate, snapshot, teardown};
use crate::domain::{
    BatchReport, MigrationPlan, MigrationRecord, MigrationStage, RecordOutcome, RecordReport,
    RecoveryPlan, SkipReason,
};

/// Whether a run may mutate provider state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Migrate,
    /// Inspect and report only; never enters a mutating stage.
    CheckOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSettings {
    pub mode: RunMode,
    pub poll: PollSettings,
    /// Snapshot class used when the mapped class is not offered.
    pub default_snapshot_sku: String,
}

/// Run every record in input order and collect the outcomes.
pub async fn run_batch(
    provider: &impl ComputeProvider,
    recovery: &impl RecoveryStore,
    records: &[MigrationRecord],
    settings: &MigrationSettings,
) -> BatchReport {
    let mut report = BatchReport {
        check_only: settings.mode == RunMode::CheckOnly,
        records: Vec::with_capacity(records.len()),
    };
    let total = records.len();
    for (i, record) in records.iter().enumerate() {
        let span = tracing::info_span!(
            "record",
            rg = %record.source_resource_group,
            vm = %record.source_vm
        );
        let outcome = async {
            tracing::info!("Processing VM {} ({}/{total})", record.source_vm, i + 1);
            migrate_record(provider, recovery, record, settings).await
        }
        .instrument(span)
        .await;
        report.records.push(RecordReport {
            record: record.clone(),
            outcome,
        });
    }
    report
}

/// Drive one record through the state machine.
pub async fn migrate_record(
    provider: &impl ComputeProvider,
    recovery: &impl RecoveryStore,
    record: &MigrationRecord,
    settings: &MigrationSettings,
) -> RecordOutcome {
    // INSPECT
    let vm = match inspector::get_vm(
        provider,
        &record.source_resource_group,
        &record.source_vm,
    )
    .await
    {
        Ok(vm) => vm,
        Err(reason) => return RecordOutcome::Skipped(reason),
    };
    inspector::report_disks(&vm);

    // ZONE_CHECK
    let already_there = vm.is_in_zone(&record.desired_zone);
    if already_there {
        tracing::warn!(
            "The desired zone '{}' is the same as the current zone. No migration needed.",
            record.desired_zone
        );
    }

    if settings.mode == RunMode::CheckOnly {
        let sku_available = match (&vm.size, already_there) {
            (Some(size), false) => {
                Some(capacity::is_sku_available(provider, &vm.location, size).await)
            }
            _ => None,
        };
        return RecordOutcome::Checked {
            zones: vm.zones,
            needs_migration: !already_there,
            sku_available,
        };
    }
    if already_there {
        return RecordOutcome::Skipped(SkipReason::AlreadyInZone {
            zone: record.desired_zone.clone(),
        });
    }

    let plan = match MigrationPlan::derive(record, &vm) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("Cannot migrate VM {}: {e}", record.source_vm);
            return RecordOutcome::Failed {
                stage: MigrationStage::Inspect,
                reason: e.to_string(),
            };
        }
    };

    // CAPACITY_CHECK
    if !capacity::is_sku_available(provider, &plan.location, &plan.size).await {
        tracing::warn!(
            "The requested VM size '{}' is not available in location '{}'. Skipping migration.",
            plan.size,
            plan.location
        );
        return RecordOutcome::Skipped(SkipReason::CapacityUnavailable {
            size: plan.size,
            location: plan.location,
        });
    }

    execute(provider, recovery, &plan, settings).await
}

/// The mutating stages, from `SNAPSHOT_ALL` to `DONE`.
async fn execute(
    provider: &impl ComputeProvider,
    recovery: &impl RecoveryStore,
    plan: &MigrationPlan,
    settings: &MigrationSettings,
) -> RecordOutcome {
    let poll = settings.poll;

    // SNAPSHOT_ALL
    let offered = capacity::snapshot_skus(provider, &plan.location).await;
    let snapshots = match snapshot::snapshot_all(
        provider,
        plan,
        &offered,
        &settings.default_snapshot_sku,
        poll,
        Utc::now().naive_utc(),
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Not deleting VM {}: {e:#}", plan.source_vm);
            return RecordOutcome::failed(MigrationStage::SnapshotAll, &e);
        }
    };

    // DELETE_SOURCE
    let recovery_plan = RecoveryPlan::new(plan, snapshot::snapshot_names(&snapshots), Utc::now());
    let recovery_path = match recovery.save(&recovery_plan).await {
        Ok(path) => path,
        Err(e) => {
            let e = e.context("recovery plan could not be persisted");
            tracing::error!("Not deleting VM {}: {e:#}", plan.source_vm);
            return RecordOutcome::failed(MigrationStage::DeleteSource, &e);
        }
    };
    tracing::info!("Recovery plan written to {}", recovery_path.display());

    let stranded = |stage: MigrationStage, e: &anyhow::Error| {
        tracing::error!(
            "VM {} was deleted but not recreated ({stage}); recover from {}",
            plan.source_vm,
            recovery_path.display()
        );
        RecordOutcome::failed(stage, e)
    };

    if let Err(e) = teardown::delete_vm(
        provider,
        &plan.source_resource_group,
        &plan.source_vm,
        &plan.source_zones,
        poll,
    )
    .await
    {
        tracing::error!(
            "{e:#}; source VM may be partially deleted, recovery plan at {}",
            recovery_path.display()
        );
        return RecordOutcome::failed(MigrationStage::DeleteSource, &e);
    }

    // CREATE_TARGET
    if let Err(e) = recreate::verify_disks_survived(provider, plan).await {
        tracing::error!("{e:#}");
        return stranded(MigrationStage::CreateTarget, &e);
    }
    let confirmed = match recreate::create_vm(provider, plan, poll).await {
        Ok(vm) => vm,
        Err(e) => return stranded(MigrationStage::CreateTarget, &e),
    };

    // START_TARGET
    if let Err(e) = recreate::start_vm(provider, &confirmed, poll).await {
        tracing::error!("{e:#}");
        return RecordOutcome::failed(MigrationStage::StartTarget, &e);
    }

    // DONE
    match provider
        .get_vm(confirmed.resource_group(), confirmed.name())
        .await
    {
        Ok(target) => inspector::report_disks(&target),
        Err(e) => tracing::warn!("Could not re-inspect VM {}: {e:#}", confirmed.name()),
    }
    tracing::info!(
        "Migrated VM {} to {} in zone {}",
        plan.source_vm,
        confirmed.name(),
        confirmed.zone()
    );
    RecordOutcome::Migrated {
        zone: confirmed.zone().to_string(),
    }
}
