//! Snapshot stage: one copy snapshot per attached disk, all awaited.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::application::ports::{OperationHandle, OperationPoller, SnapshotRequest, SnapshotWriter};
use crate::application::services::operation::{PollSettings, wait_for_completion};
use crate::domain::snapshot::{select_snapshot_sku, snapshot_name};
use crate::domain::{AttachedDisk, MigrationPlan, ProviderError};

/// A snapshot that was accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedSnapshot {
    pub disk_name: String,
    pub snapshot_name: String,
    pub sku: String,
    pub operation: OperationHandle,
}

/// Submit a snapshot of one disk into `resource_group`.
///
/// # Errors
///
/// Returns the provider error, logged here. A vanished source disk is logged
/// as a missing resource.
pub async fn snapshot_disk(
    writer: &impl SnapshotWriter,
    resource_group: &str,
    disk: &AttachedDisk,
    location: &str,
    sku: &str,
    captured_at: NaiveDateTime,
) -> Result<SubmittedSnapshot> {
    let request = SnapshotRequest {
        name: snapshot_name(&disk.name, captured_at),
        source_disk_id: disk.id.clone(),
        location: location.to_string(),
        sku: sku.to_string(),
    };
    match writer.begin_create_snapshot(resource_group, &request).await {
        Ok(operation) => {
            tracing::info!(
                "Creating snapshot for {} as {} ({sku})",
                disk.name,
                request.name
            );
            Ok(SubmittedSnapshot {
                disk_name: disk.name.clone(),
                snapshot_name: request.name,
                sku: request.sku,
                operation,
            })
        }
        Err(e) if ProviderError::is_not_found(&e) => {
            tracing::error!(
                "Resource {} with ID {} not found in {resource_group}",
                disk.name,
                disk.id
            );
            Err(e)
        }
        Err(e) => {
            tracing::error!("Failed to snapshot disk {}: {e:#}", disk.name);
            Err(e)
        }
    }
}

/// Snapshot every disk of `plan` and wait for all snapshots to complete.
///
/// Every disk is attempted even after one fails, and every accepted snapshot
/// is awaited, so a failed stage leaves no snapshot still in flight.
///
/// # Errors
///
/// Returns an error unless every disk has a completed snapshot.
pub async fn snapshot_all(
    provider: &(impl SnapshotWriter + OperationPoller),
    plan: &MigrationPlan,
    offered_skus: &[String],
    default_sku: &str,
    poll: PollSettings,
    captured_at: NaiveDateTime,
) -> Result<Vec<SubmittedSnapshot>> {
    let mut submitted = Vec::new();
    let mut missing = Vec::new();
    for disk in plan.disks() {
        let sku = select_snapshot_sku(disk.redundancy.as_deref(), offered_skus, default_sku);
        match snapshot_disk(
            provider,
            &plan.source_resource_group,
            disk,
            &plan.location,
            &sku,
            captured_at,
        )
        .await
        {
            Ok(s) => submitted.push(s),
            Err(_) => missing.push(disk.name.clone()),
        }
    }

    for snap in &submitted {
        if let Err(e) = wait_for_completion(provider, &snap.operation, poll).await {
            tracing::error!("Snapshot {} did not complete: {e:#}", snap.snapshot_name);
            missing.push(snap.disk_name.clone());
        }
    }

    if !missing.is_empty() {
        anyhow::bail!(
            "snapshot coverage incomplete for {}: {}",
            plan.source_vm,
            missing.join(", ")
        );
    }
    Ok(submitted)
}

/// Names of the snapshots, in submission order.
#[must_use]
pub fn snapshot_names(snapshots: &[SubmittedSnapshot]) -> Vec<String> {
    snapshots.iter().map(|s| s.snapshot_name.clone()).collect()
}
