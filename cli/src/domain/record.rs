//! Migration input records.
//!
//! One record is one row of the migration sheet and identifies exactly one
//! migration attempt.

use serde::{Deserialize, Serialize};

use crate::domain::error::RecordError;

/// Column headers of the migration sheet, in sheet order.
pub const COL_SOURCE_RG: &str = "#Source Resource Group Name";
pub const COL_SOURCE_VM: &str = "Source VM Name";
pub const COL_SOURCE_OS: &str = "Source OS Type";
pub const COL_DESIRED_RG: &str = "Desired Resource Group Name";
pub const COL_DESIRED_VM: &str = "Desired VM Name";
pub const COL_DESIRED_ZONE: &str = "Desired Zone";

pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_SOURCE_RG,
    COL_SOURCE_VM,
    COL_SOURCE_OS,
    COL_DESIRED_RG,
    COL_DESIRED_VM,
    COL_DESIRED_ZONE,
];

/// Operating system family used for the attach-only OS disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    Linux,
    Windows,
}

impl OsType {
    /// Case-insensitive substring match on `linux`; anything else is Windows.
    #[must_use]
    pub fn from_hint(hint: &str) -> Self {
        if hint.trim().to_lowercase().contains("linux") {
            Self::Linux
        } else {
            Self::Windows
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
        }
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of input. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub source_resource_group: String,
    pub source_vm: String,
    /// Free-text OS hint as typed in the sheet.
    pub source_os: String,
    pub desired_resource_group: String,
    pub desired_vm: String,
    pub desired_zone: String,
}

impl MigrationRecord {
    /// Build a record from the raw field values of sheet row `row` (1-based,
    /// header excluded), in `REQUIRED_COLUMNS` order.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::EmptyField` if any value is blank.
    pub fn from_fields(row: usize, fields: [&str; 6]) -> Result<Self, RecordError> {
        for (value, column) in fields.iter().zip(REQUIRED_COLUMNS) {
            if value.trim().is_empty() {
                return Err(RecordError::EmptyField {
                    row,
                    field: (*column).to_string(),
                });
            }
        }
        let [source_rg, source_vm, source_os, desired_rg, desired_vm, desired_zone] =
            fields.map(|f| f.trim().to_string());
        Ok(Self {
            source_resource_group: source_rg,
            source_vm,
            source_os,
            desired_resource_group: desired_rg,
            desired_vm,
            desired_zone,
        })
    }

    #[must_use]
    pub fn os_type(&self) -> OsType {
        OsType::from_hint(&self.source_os)
    }
}
