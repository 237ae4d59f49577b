//! Observable VM state and the identifiers a migration derives from it.
//!
//! Pure types only. A `VmSnapshot` is captured fresh per attempt and becomes
//! stale as soon as a mutating stage runs; a `MigrationPlan` copies out the
//! identifiers the mutating stages need so none of them re-reads the snapshot.

use serde::{Deserialize, Serialize};

use crate::domain::error::AttributeError;
use crate::domain::record::{MigrationRecord, OsType};

/// Whether a disk is the OS disk or a data disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskKind {
    Os,
    Data,
}

/// A disk attached to an inspected VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRef {
    pub kind: DiskKind,
    pub name: String,
    /// Managed disk resource ID. `None` for unmanaged (blob) disks.
    pub id: Option<String>,
    /// Data disk LUN. `None` for the OS disk.
    pub lun: Option<u32>,
    /// Storage redundancy class, e.g. `Premium_LRS`.
    pub redundancy: Option<String>,
}

/// Current observable state of a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSnapshot {
    pub name: String,
    pub location: String,
    /// Zones the VM is pinned to; empty for a regional VM.
    pub zones: Vec<String>,
    pub size: Option<String>,
    pub os_type: Option<String>,
    pub os_disk: Option<DiskRef>,
    pub data_disks: Vec<DiskRef>,
    /// Network interface IDs, primary first.
    pub nic_ids: Vec<String>,
}

impl VmSnapshot {
    /// OS disk first, then data disks in the order the provider reports them.
    #[must_use]
    pub fn disks(&self) -> Vec<&DiskRef> {
        self.os_disk.iter().chain(self.data_disks.iter()).collect()
    }

    /// Whether `zone` is one of the zones the VM is currently pinned to.
    #[must_use]
    pub fn is_in_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone)
    }
}

/// A managed disk referenced by ID in an attach-only create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDisk {
    pub name: String,
    pub id: String,
    pub lun: Option<u32>,
    pub redundancy: Option<String>,
}

/// Everything the mutating stages need, copied out of one inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub source_resource_group: String,
    pub source_vm: String,
    pub source_zones: Vec<String>,
    pub target_resource_group: String,
    pub target_vm: String,
    pub target_zone: String,
    pub location: String,
    pub size: String,
    pub os_type: OsType,
    pub os_disk: AttachedDisk,
    pub data_disks: Vec<AttachedDisk>,
    pub nic_id: String,
}

impl MigrationPlan {
    /// Derive the plan for `record` from a fresh inspection of its source VM.
    ///
    /// # Errors
    ///
    /// Returns an `AttributeError` when the VM lacks a size, a managed OS disk,
    /// a LUN on a data disk, or a network interface.
    pub fn derive(record: &MigrationRecord, vm: &VmSnapshot) -> Result<Self, AttributeError> {
        let size = vm
            .size
            .clone()
            .ok_or_else(|| AttributeError::NoSize(vm.name.clone()))?;
        let os = vm
            .os_disk
            .as_ref()
            .ok_or_else(|| AttributeError::NoOsDisk(vm.name.clone()))?;
        let os_disk = attached(&vm.name, os)?;
        let data_disks = vm
            .data_disks
            .iter()
            .map(|d| {
                let disk = attached(&vm.name, d)?;
                if disk.lun.is_none() {
                    return Err(AttributeError::NoLun {
                        vm: vm.name.clone(),
                        disk: d.name.clone(),
                    });
                }
                Ok(disk)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let nic_id = vm
            .nic_ids
            .first()
            .cloned()
            .ok_or_else(|| AttributeError::NoNetworkInterface(vm.name.clone()))?;

        Ok(Self {
            source_resource_group: record.source_resource_group.clone(),
            source_vm: record.source_vm.clone(),
            source_zones: vm.zones.clone(),
            target_resource_group: record.desired_resource_group.clone(),
            target_vm: record.desired_vm.clone(),
            target_zone: record.desired_zone.clone(),
            location: vm.location.clone(),
            size,
            os_type: record.os_type(),
            os_disk,
            data_disks,
            nic_id,
        })
    }

    /// OS disk first, then data disks.
    #[must_use]
    pub fn disks(&self) -> Vec<&AttachedDisk> {
        std::iter::once(&self.os_disk)
            .chain(self.data_disks.iter())
            .collect()
    }
}

fn attached(vm: &str, disk: &DiskRef) -> Result<AttachedDisk, AttributeError> {
    let id = disk.id.clone().ok_or_else(|| AttributeError::UnmanagedDisk {
        vm: vm.to_string(),
        disk: disk.name.clone(),
    })?;
    Ok(AttachedDisk {
        name: disk.name.clone(),
        id,
        lun: disk.lun,
        redundancy: disk.redundancy.clone(),
    })
}
