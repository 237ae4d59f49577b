//! Teardown stage: delete the source VM and wait for the delete to finish.
//!
//! Managed disks survive deletion; they are reattached by the recreation stage.

use anyhow::{Context, Result};

use crate::application::ports::{InstanceLifecycle, OperationPoller};
use crate::application::services::operation::{PollSettings, wait_for_completion};

/// Delete `vm_name` and block until the provider reports completion.
///
/// # Errors
///
/// Returns an error if the delete cannot be submitted, fails, or times out.
/// Nothing is retried or cleaned up.
pub async fn delete_vm(
    provider: &(impl InstanceLifecycle + OperationPoller),
    resource_group: &str,
    vm_name: &str,
    zones: &[String],
    poll: PollSettings,
) -> Result<()> {
    tracing::info!("Deleting VM {vm_name} in {resource_group} with zones {zones:?}");
    let handle = provider
        .begin_delete_vm(resource_group, vm_name)
        .await
        .with_context(|| format!("failed to delete VM {resource_group}/{vm_name}"))?;
    wait_for_completion(provider, &handle, poll)
        .await
        .with_context(|| format!("deleting VM {resource_group}/{vm_name} did not complete"))?;
    tracing::info!("Deleted VM {vm_name} in {resource_group}");
    Ok(())
}
