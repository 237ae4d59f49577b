//! Awaiting long-running provider operations.
//!
//! Every mutating call returns an `OperationHandle`; nothing downstream runs
//! until the handle reaches a terminal state.

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use crate::application::ports::{OperationHandle, OperationPoller, OperationStatus};
use crate::domain::ProviderError;
use crate::domain::config::PollingConfig;

/// Polling cadence and the overall deadline for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&PollingConfig> for PollSettings {
    fn from(cfg: &PollingConfig) -> Self {
        Self {
            interval: cfg.interval(),
            timeout: cfg.timeout(),
        }
    }
}

/// Poll `handle` until it succeeds, fails, or runs out of time.
///
/// # Errors
///
/// Returns the operation's `ProviderError` when it ends in a failed state,
/// `ProviderError::Timeout` when `settings.timeout` elapses first, or any
/// error raised while polling.
pub async fn wait_for_completion(
    poller: &impl OperationPoller,
    handle: &OperationHandle,
    settings: PollSettings,
) -> Result<()> {
    if handle.poll_url.is_none() {
        return Ok(());
    }
    let deadline = Instant::now() + settings.timeout;
    loop {
        match poller.poll(handle).await? {
            OperationStatus::Succeeded => {
                tracing::debug!(operation = %handle.operation, "operation succeeded");
                return Ok(());
            }
            OperationStatus::Failed(err) => return Err(err.into()),
            OperationStatus::InProgress => {}
        }
        if Instant::now() >= deadline {
            return Err(ProviderError::Timeout {
                operation: handle.operation.clone(),
                secs: settings.timeout.as_secs(),
            }
            .into());
        }
        tokio::time::sleep(settings.interval).await;
    }
}
