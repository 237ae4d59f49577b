//! Long-running operation status returned by an `Azure-AsyncOperation` URL.

use serde::{Deserialize, Serialize};

use crate::error::ErrorBody;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOperation {
    pub status: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Terminal and non-terminal states of an ARM async operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
    /// Some resource providers report custom non-terminal states.
    #[serde(other)]
    Other,
}

impl OperationState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}
