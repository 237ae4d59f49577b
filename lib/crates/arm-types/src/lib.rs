//! Serde models for the Azure Resource Manager (ARM) compute surface.
//!
//! Only the fields the migration tool reads or writes are modelled; unknown
//! fields are ignored on deserialization so newer API versions stay readable.

pub mod compute;
pub mod error;
pub mod operation;
pub mod sku;

pub use compute::{
    DataDisk, Disk, DiskProperties, HardwareProfile, ManagedDiskParameters,
    NetworkInterfaceReference, NetworkInterfaceReferenceProperties, NetworkProfile, OsDisk,
    Snapshot, SnapshotCreationData, SnapshotProperties, SnapshotSku, StorageProfile,
    VirtualMachine, VirtualMachineProperties,
};
pub use error::{ErrorBody, ErrorResponse};
pub use operation::{AsyncOperation, OperationState};
pub use sku::{ResourceSku, SkuList};
