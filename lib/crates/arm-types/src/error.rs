//! ARM error envelope: `{"error": {"code": "...", "message": "..."}}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<ErrorBody>,
}

impl ErrorBody {
    /// Outer error code followed by every detail code.
    ///
    /// ARM wraps some failures (e.g. `SkuNotAvailable`) in a generic outer
    /// code such as `InvalidParameter` or `Conflict`.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        let mut out = vec![self.code.as_str()];
        out.extend(self.details.iter().map(|d| d.code.as_str()));
        out
    }
}
