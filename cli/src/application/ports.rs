//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::{
    MigrateConfig, MigrationRecord, OsType, ProviderError, RecoveryPlan, VmSnapshot,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Bearer token for the management plane.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    /// Expiry as reported by the issuer. `None` when the issuer did not say.
    pub expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token expires within `margin` of `now`. A token without a
    /// known expiry is assumed valid until the provider rejects it.
    #[must_use]
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        let Some(expires_on) = self.expires_on else {
            return false;
        };
        match chrono::Duration::from_std(margin) {
            Ok(margin) => expires_on - margin <= now,
            Err(_) => true,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// How the status URL of an operation reports progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMonitor {
    /// Answers `{"status": ...}` until the operation is terminal.
    AsyncOperation,
    /// Answers 202 while running and 200/204 once done.
    Location,
}

/// Handle to a submitted long-running provider operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Human-readable description, e.g. `delete VM rg/web01`.
    pub operation: String,
    /// URL to poll for the terminal state. `None` when the provider completed
    /// the request synchronously.
    pub poll_url: Option<String>,
    pub monitor: StatusMonitor,
}

impl OperationHandle {
    /// A handle for a request that completed synchronously.
    #[must_use]
    pub fn completed(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            poll_url: None,
            monitor: StatusMonitor::AsyncOperation,
        }
    }

    /// A handle polled through `url`.
    #[must_use]
    pub fn polled(
        operation: impl Into<String>,
        url: impl Into<String>,
        monitor: StatusMonitor,
    ) -> Self {
        Self {
            operation: operation.into(),
            poll_url: Some(url.into()),
            monitor,
        }
    }
}

/// Observed state of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed(ProviderError),
}

/// One entry of the provider's SKU catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSku {
    /// `virtualMachines`, `snapshots`, `disks`, ...
    pub resource_type: String,
    pub name: String,
    pub locations: Vec<String>,
}

/// A managed disk looked up by resource ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDisk {
    pub id: String,
    /// Attachment state, e.g. `Unattached`.
    pub state: Option<String>,
}

/// Parameters of one snapshot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub name: String,
    pub source_disk_id: String,
    pub location: String,
    /// Snapshot-legal redundancy class.
    pub sku: String,
}

/// Attach-only VM create request: every disk is referenced by resource ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmCreateSpec {
    pub location: String,
    /// The single zone the new VM is pinned to.
    pub zone: String,
    pub size: String,
    pub os_type: OsType,
    pub os_disk_id: String,
    /// `(lun, disk id)` pairs.
    pub data_disks: Vec<(u32, String)>,
    pub nic_id: String,
}

// ── Compute Port Traits ───────────────────────────────────────────────────────

/// Read access to virtual machines.
#[allow(async_fn_in_trait)]
pub trait VmInspector {
    /// Fetch the current state of a VM.
    ///
    /// Fails with `ProviderError::NotFound` when the VM does not exist.
    async fn get_vm(&self, resource_group: &str, vm_name: &str) -> Result<VmSnapshot>;
}

/// Read access to managed disks.
#[allow(async_fn_in_trait)]
pub trait DiskInspector {
    /// Fetch a managed disk by resource ID.
    ///
    /// Fails with `ProviderError::NotFound` when the disk does not exist.
    async fn get_disk(&self, disk_id: &str) -> Result<ManagedDisk>;
}

/// The provider's size-class catalog.
#[allow(async_fn_in_trait)]
pub trait SkuCatalog {
    /// Enumerate every catalog entry visible to the subscription.
    async fn list_skus(&self) -> Result<Vec<CatalogSku>>;
}

/// Snapshot submission.
#[allow(async_fn_in_trait)]
pub trait SnapshotWriter {
    /// Submit a copy snapshot of a managed disk.
    async fn begin_create_snapshot(
        &self,
        resource_group: &str,
        request: &SnapshotRequest,
    ) -> Result<OperationHandle>;
}

/// VM lifecycle operations: delete, create, start.
#[allow(async_fn_in_trait)]
pub trait InstanceLifecycle {
    /// Submit deletion of a VM. Attached managed disks are detached, not deleted.
    async fn begin_delete_vm(&self, resource_group: &str, vm_name: &str)
    -> Result<OperationHandle>;
    /// Submit creation of a VM that attaches existing disks.
    async fn begin_create_vm(
        &self,
        resource_group: &str,
        vm_name: &str,
        spec: &VmCreateSpec,
    ) -> Result<OperationHandle>;
    /// Submit a start of a VM.
    async fn begin_start_vm(&self, resource_group: &str, vm_name: &str)
    -> Result<OperationHandle>;
}

/// Long-running operation polling.
#[allow(async_fn_in_trait)]
pub trait OperationPoller {
    /// Query the current state of a submitted operation once.
    async fn poll(&self, operation: &OperationHandle) -> Result<OperationStatus>;
}

/// Composite trait: any type implementing every compute port is a `ComputeProvider`.
pub trait ComputeProvider:
    VmInspector + DiskInspector + SkuCatalog + SnapshotWriter + InstanceLifecycle + OperationPoller
{
}

/// Blanket implementation: any type implementing every compute port is a `ComputeProvider`.
impl<T> ComputeProvider for T where
    T: VmInspector
        + DiskInspector
        + SkuCatalog
        + SnapshotWriter
        + InstanceLifecycle
        + OperationPoller
{
}

// ── Session Port ──────────────────────────────────────────────────────────────

/// Supplies an authenticated session. The first token is acquired before any
/// record runs; later ones replace it as it nears expiry.
#[allow(async_fn_in_trait)]
pub trait CredentialProvider {
    /// Acquire a management-plane token for `subscription_id`.
    async fn access_token(&self, subscription_id: &str) -> Result<AccessToken>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
}

// ── Input and Persistence Ports ───────────────────────────────────────────────

/// Source of migration records.
pub trait RecordSource {
    /// Read and validate every record. Any malformed row fails the whole load.
    fn load(&self) -> Result<Vec<MigrationRecord>>;
}

/// Durable storage for recovery plans.
#[allow(async_fn_in_trait)]
pub trait RecoveryStore {
    /// Persist a plan and return where it was written.
    async fn save(&self, plan: &RecoveryPlan) -> Result<PathBuf>;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if no file exists.
    fn load(&self) -> Result<MigrateConfig>;
    /// Persist the configuration.
    fn save(&self, config: &MigrateConfig) -> Result<()>;
    /// Path of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
