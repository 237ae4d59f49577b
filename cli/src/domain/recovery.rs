//! Recovery plan persisted before the source VM is deleted.
//!
//! Holds enough to recreate the VM by hand (or in place) if the run stops
//! anywhere between `DELETE_SOURCE` and `START_TARGET`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::record::OsType;
use crate::domain::vm::{AttachedDisk, MigrationPlan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub recorded_at: DateTime<Utc>,
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
    /// Names of the snapshots taken before deletion.
    pub snapshots: Vec<String>,
}

impl RecoveryPlan {
    #[must_use]
    pub fn new(plan: &MigrationPlan, snapshots: Vec<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at,
            source_resource_group: plan.source_resource_group.clone(),
            source_vm: plan.source_vm.clone(),
            source_zones: plan.source_zones.clone(),
            target_resource_group: plan.target_resource_group.clone(),
            target_vm: plan.target_vm.clone(),
            target_zone: plan.target_zone.clone(),
            location: plan.location.clone(),
            size: plan.size.clone(),
            os_type: plan.os_type,
            os_disk: plan.os_disk.clone(),
            data_disks: plan.data_disks.clone(),
            nic_id: plan.nic_id.clone(),
            snapshots,
        }
    }

    /// File stem unique per source VM and second: `<rg>_<vm>_<YYYYmmddHHMMSS>`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.source_resource_group,
            self.source_vm,
            self.recorded_at.format("%Y%m%d%H%M%S")
        )
    }
}
