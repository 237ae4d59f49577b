//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Services recover the typed variant with
//! `anyhow::Error::downcast_ref`.

use thiserror::Error;

// ── Provider errors ───────────────────────────────────────────────────────────

/// Failures reported by the cloud compute API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("SKU not available: {0}")]
    SkuNotAvailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Throttling, 5xx and transport failures: safe to retry.
    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider returned HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("operation {operation} ended in state {state}: {message}")]
    OperationFailed {
        operation: String,
        state: String,
        message: String,
    },

    #[error("operation {operation} did not reach a terminal state within {secs}s")]
    Timeout { operation: String, secs: u64 },
}

impl ProviderError {
    /// Whether a retry of the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether the provider refused the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// Look through an `anyhow` chain for a typed provider error.
    #[must_use]
    pub fn find(err: &anyhow::Error) -> Option<&ProviderError> {
        err.chain().find_map(|e| e.downcast_ref::<ProviderError>())
    }

    /// Whether the chain carries a `NotFound` provider error.
    #[must_use]
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(Self::find(err), Some(Self::NotFound(_)))
    }

    /// Whether the chain carries a `SkuNotAvailable` provider error.
    #[must_use]
    pub fn is_sku_not_available(err: &anyhow::Error) -> bool {
        matches!(Self::find(err), Some(Self::SkuNotAvailable(_)))
    }
}

// ── Input record errors ───────────────────────────────────────────────────────

/// Errors raised while parsing the migration input. All of them abort the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("input is missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: required field '{field}' is empty")]
    EmptyField { row: usize, field: String },
}

// ── Inspected VM attribute errors ─────────────────────────────────────────────

/// An inspected VM lacks an attribute the migration needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("VM '{0}' has no OS disk")]
    NoOsDisk(String),

    #[error("VM '{vm}' disk '{disk}' is not a managed disk")]
    UnmanagedDisk { vm: String, disk: String },

    #[error("VM '{vm}' data disk '{disk}' has no LUN")]
    NoLun { vm: String, disk: String },

    #[error("VM '{0}' has no network interface")]
    NoNetworkInterface(String),

    #[error("VM '{0}' has no size class")]
    NoSize(String),
}

// ── Credential errors ─────────────────────────────────────────────────────────

/// Failures acquiring an authenticated session.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Azure CLI is not installed. Please install it and log in using 'az login'.")]
    CliMissing,

    #[error("You are not logged in to Azure. Please run 'az login' to log in.\n{0}")]
    NotLoggedIn(String),

    #[error("Azure CLI returned an unreadable access token: {0}")]
    Malformed(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
