//! Recreation stage: build the attach-only VM in the target zone, then start it.
//!
//! `start_vm` only accepts a `ConfirmedVm`, which `create_vm` hands out once
//! the create operation has succeeded.

use anyhow::{Context, Result};

use crate::application::ports::{DiskInspector, InstanceLifecycle, OperationPoller, VmCreateSpec};
use crate::application::services::operation::{PollSettings, wait_for_completion};
use crate::domain::{MigrationPlan, ProviderError};

/// A VM whose creation the provider confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedVm {
    resource_group: String,
    name: String,
    zone: String,
}

impl ConfirmedVm {
    #[must_use]
    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }
}

/// Attach-only create request for `plan`, pinned to its single target zone.
#[must_use]
pub fn create_spec(plan: &MigrationPlan) -> VmCreateSpec {
    VmCreateSpec {
        location: plan.location.clone(),
        zone: plan.target_zone.clone(),
        size: plan.size.clone(),
        os_type: plan.os_type,
        os_disk_id: plan.os_disk.id.clone(),
        data_disks: plan
            .data_disks
            .iter()
            .filter_map(|d| d.lun.map(|lun| (lun, d.id.clone())))
            .collect(),
        nic_id: plan.nic_id.clone(),
    }
}

/// Check that every disk of `plan` still exists after the source was deleted.
///
/// # Errors
///
/// Returns an error naming the first disk that is missing or cannot be read.
pub async fn verify_disks_survived(
    disks: &impl DiskInspector,
    plan: &MigrationPlan,
) -> Result<()> {
    for disk in plan.disks() {
        match disks.get_disk(&disk.id).await {
            Ok(_) => {}
            Err(e) if ProviderError::is_not_found(&e) => {
                return Err(e.context(format!(
                    "disk {} ({}) missing after delete",
                    disk.name, disk.id
                )));
            }
            Err(e) => {
                return Err(e.context(format!(
                    "cannot verify disk {} ({}) after delete",
                    disk.name, disk.id
                )));
            }
        }
    }
    Ok(())
}

/// Create the target VM and wait for the provider to confirm it.
///
/// A `SkuNotAvailable` failure is logged as a warning, anything else as an
/// error.
///
/// # Errors
///
/// Returns the create failure. No `ConfirmedVm` exists in that case.
pub async fn create_vm(
    provider: &(impl InstanceLifecycle + OperationPoller),
    plan: &MigrationPlan,
    poll: PollSettings,
) -> Result<ConfirmedVm> {
    let spec = create_spec(plan);
    tracing::info!(
        "Creating VM {} in {} at zone {}",
        plan.target_vm,
        plan.target_resource_group,
        plan.target_zone
    );
    let result = async {
        let handle = provider
            .begin_create_vm(&plan.target_resource_group, &plan.target_vm, &spec)
            .await?;
        wait_for_completion(provider, &handle, poll).await
    }
    .await;

    match result {
        Ok(()) => Ok(ConfirmedVm {
            resource_group: plan.target_resource_group.clone(),
            name: plan.target_vm.clone(),
            zone: plan.target_zone.clone(),
        }),
        Err(e) if ProviderError::is_sku_not_available(&e) => {
            tracing::warn!(
                "The requested VM size '{}' is not available in location '{}'. Please try another size or location.",
                plan.size,
                plan.location
            );
            Err(e)
        }
        Err(e) => {
            tracing::error!("An error occurred while creating VM '{}': {e:#}", plan.target_vm);
            Err(e)
        }
    }
}

/// Start a confirmed VM and wait until it is running.
///
/// # Errors
///
/// Returns an error if the start cannot be submitted, fails, or times out.
pub async fn start_vm(
    provider: &(impl InstanceLifecycle + OperationPoller),
    vm: &ConfirmedVm,
    poll: PollSettings,
) -> Result<()> {
    tracing::info!("Starting VM {} in {}", vm.name, vm.resource_group);
    let handle = provider
        .begin_start_vm(&vm.resource_group, &vm.name)
        .await
        .with_context(|| format!("failed to start VM {}/{}", vm.resource_group, vm.name))?;
    wait_for_completion(provider, &handle, poll)
        .await
        .with_context(|| format!("starting VM {}/{} did not complete", vm.resource_group, vm.name))
}
