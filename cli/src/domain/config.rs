//! Domain types and validators for az-zone-migrate configuration.
//!
//! Pure functions only. No I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::snapshot::{DEFAULT_SNAPSHOT_SKU, SNAPSHOT_SKUS, is_snapshot_sku};

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "azure.endpoint",
    "azure.compute_api_version",
    "azure.disk_api_version",
    "azure.sku_api_version",
    "polling.interval_secs",
    "polling.timeout_secs",
    "retry.max_elapsed_secs",
    "snapshot.default_sku",
    "recovery.dir",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.az-zone-migrate/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MigrateConfig {
    pub azure: AzureConfig,
    pub polling: PollingConfig,
    pub retry: RetryConfig,
    pub snapshot: SnapshotConfig,
    pub recovery: RecoveryConfig,
}

/// Resource Manager endpoint and API versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: String,
    pub compute_api_version: String,
    pub disk_api_version: String,
    pub sku_api_version: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://management.azure.com".to_string(),
            compute_api_version: "2024-07-01".to_string(),
            disk_api_version: "2024-03-02".to_string(),
            sku_api_version: "2021-07-01".to_string(),
        }
    }
}

/// How long-running operations are awaited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_secs: 1800,
        }
    }
}

/// Bounded exponential backoff for transient provider errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_elapsed_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Snapshot class used when the mapped class is not offered.
    pub default_sku: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            default_sku: DEFAULT_SNAPSHOT_SKU.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Directory for recovery plans. `None` → `~/.az-zone-migrate/recovery`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl PollingConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    #[must_use]
    pub fn max_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_elapsed_secs)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(unknown_key(key));
    }
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    ConfigError::UnknownKey {
        key: key.to_string(),
        valid: VALID_CONFIG_KEYS.join(", "),
    }
    .into()
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |expected: &str| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
        .into()
    };
    match key {
        "azure.endpoint" => {
            if !value.starts_with("https://") {
                return Err(invalid("an https:// URL"));
            }
        }
        "azure.compute_api_version" | "azure.disk_api_version" | "azure.sku_api_version" => {
            if chrono::NaiveDate::parse_from_str(value.trim_end_matches("-preview"), "%Y-%m-%d")
                .is_err()
            {
                return Err(invalid("an API version such as 2024-07-01"));
            }
        }
        "polling.interval_secs" | "polling.timeout_secs" | "retry.max_elapsed_secs" => {
            if !value.parse::<u64>().is_ok_and(|n| n > 0) {
                return Err(invalid("a positive number of seconds"));
            }
        }
        "snapshot.default_sku" => {
            if !is_snapshot_sku(value) {
                return Err(invalid(&SNAPSHOT_SKUS.join(", ")));
            }
        }
        "recovery.dir" => {
            if value.trim().is_empty() {
                return Err(invalid("a directory path"));
            }
        }
        other => return Err(unknown_key(other)),
    }
    Ok(())
}

impl MigrateConfig {
    /// Read a setting by dotted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn get(&self, key: &str) -> Result<String> {
        Ok(match key {
            "azure.endpoint" => self.azure.endpoint.clone(),
            "azure.compute_api_version" => self.azure.compute_api_version.clone(),
            "azure.disk_api_version" => self.azure.disk_api_version.clone(),
            "azure.sku_api_version" => self.azure.sku_api_version.clone(),
            "polling.interval_secs" => self.polling.interval_secs.to_string(),
            "polling.timeout_secs" => self.polling.timeout_secs.to_string(),
            "retry.max_elapsed_secs" => self.retry.max_elapsed_secs.to_string(),
            "snapshot.default_sku" => self.snapshot.default_sku.clone(),
            "recovery.dir" => self
                .recovery
                .dir
                .as_ref()
                .map_or_else(|| "(default)".to_string(), |p| p.display().to_string()),
            other => return Err(unknown_key(other)),
        })
    }

    /// Apply a validated setting by dotted key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_value(key, value)?;
        let secs = || value.parse::<u64>().unwrap_or_default();
        match key {
            "azure.endpoint" => self.azure.endpoint = value.trim_end_matches('/').to_string(),
            "azure.compute_api_version" => self.azure.compute_api_version = value.to_string(),
            "azure.disk_api_version" => self.azure.disk_api_version = value.to_string(),
            "azure.sku_api_version" => self.azure.sku_api_version = value.to_string(),
            "polling.interval_secs" => self.polling.interval_secs = secs(),
            "polling.timeout_secs" => self.polling.timeout_secs = secs(),
            "retry.max_elapsed_secs" => self.retry.max_elapsed_secs = secs(),
            "snapshot.default_sku" => self.snapshot.default_sku = canonical_sku(value),
            "recovery.dir" => self.recovery.dir = Some(PathBuf::from(value)),
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }
}

fn canonical_sku(value: &str) -> String {
    SNAPSHOT_SKUS
        .iter()
        .find(|s| s.eq_ignore_ascii_case(value))
        .map_or_else(|| value.to_string(), |s| (*s).to_string())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
