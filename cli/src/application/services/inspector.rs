//! Read-only inspection of source and target VMs.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::VmInspector;
use crate::domain::{DiskKind, DiskRef, ProviderError, SkipReason, VmSnapshot};

/// Fetch a VM, classifying failures as skip reasons.
///
/// A missing VM is logged as a warning, any other failure as an error. Neither
/// is fatal to the batch.
///
/// # Errors
///
/// Returns `SkipReason::NotFound` or `SkipReason::InspectFailed`.
pub async fn get_vm(
    inspector: &impl VmInspector,
    resource_group: &str,
    vm_name: &str,
) -> Result<VmSnapshot, SkipReason> {
    match inspector.get_vm(resource_group, vm_name).await {
        Ok(vm) => {
            tracing::info!(
                "VM '{vm_name}' in resource group '{resource_group}' has SKU: {}",
                vm.size.as_deref().unwrap_or("unknown")
            );
            Ok(vm)
        }
        Err(e) if ProviderError::is_not_found(&e) => {
            tracing::warn!(
                "The VM '{vm_name}' in resource group '{resource_group}' was not found. Please check the resource group and VM name."
            );
            Err(SkipReason::NotFound)
        }
        Err(e) => {
            tracing::error!(
                "An error occurred while checking VM '{vm_name}' in '{resource_group}': {e:#}"
            );
            Err(SkipReason::InspectFailed {
                message: format!("{e:#}"),
            })
        }
    }
}

/// The OS disk and data disks of a VM, OS disk first.
#[must_use]
pub fn list_disks(vm: &VmSnapshot) -> Vec<&DiskRef> {
    vm.disks()
}

/// Log every disk attached to `vm`.
pub fn report_disks(vm: &VmSnapshot) {
    for disk in list_disks(vm) {
        let id = disk.id.as_deref().unwrap_or("(unmanaged)");
        match disk.kind {
            DiskKind::Os => tracing::info!("OS Disk Name: {}, Resource ID: {id}", disk.name),
            DiskKind::Data => tracing::info!(
                "Data Disk Name: {}, LUN: {}, Resource ID: {id}",
                disk.name,
                disk.lun.map_or_else(|| "?".to_string(), |l| l.to_string())
            ),
        }
    }
}
