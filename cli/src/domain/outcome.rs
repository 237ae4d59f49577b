//! Per-record migration stages and outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::record::MigrationRecord;

/// States of the per-record migration state machine, in execution order.
/// There are no backward transitions and no rollback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationStage {
    Inspect,
    ZoneCheck,
    CapacityCheck,
    SnapshotAll,
    DeleteSource,
    CreateTarget,
    StartTarget,
    Done,
}

impl MigrationStage {
    /// Whether entering this stage changes provider-side state.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::SnapshotAll | Self::DeleteSource | Self::CreateTarget | Self::StartTarget
        )
    }
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inspect => "INSPECT",
            Self::ZoneCheck => "ZONE_CHECK",
            Self::CapacityCheck => "CAPACITY_CHECK",
            Self::SnapshotAll => "SNAPSHOT_ALL",
            Self::DeleteSource => "DELETE_SOURCE",
            Self::CreateTarget => "CREATE_TARGET",
            Self::StartTarget => "START_TARGET",
            Self::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Why a record was skipped without any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Source VM does not exist in the source resource group.
    NotFound,
    /// Any other failure reading the source VM.
    InspectFailed { message: String },
    /// Desired zone is already one of the VM's zones.
    AlreadyInZone { zone: String },
    /// VM size not offered in the VM's location.
    CapacityUnavailable { size: String, location: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("source VM not found"),
            Self::InspectFailed { message } => write!(f, "inspection failed: {message}"),
            Self::AlreadyInZone { zone } => write!(f, "already in zone {zone}"),
            Self::CapacityUnavailable { size, location } => {
                write!(f, "size {size} not available in {location}")
            }
        }
    }
}

/// Tagged result of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Target VM created in the desired zone and started.
    Migrated { zone: String },
    /// Check-only mode: inspected and reported, nothing mutated.
    Checked {
        zones: Vec<String>,
        needs_migration: bool,
        /// `None` when the capacity check was not reached.
        sku_available: Option<bool>,
    },
    Skipped(SkipReason),
    Failed {
        stage: MigrationStage,
        reason: String,
    },
}

impl RecordOutcome {
    #[must_use]
    pub fn failed(stage: MigrationStage, err: &anyhow::Error) -> Self {
        Self::Failed {
            stage,
            reason: format!("{err:#}"),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of one record, with the record it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub record: MigrationRecord,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// All outcomes of a run, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub check_only: bool,
    pub records: Vec<RecordReport>,
}

/// Outcome counts for the summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    pub migrated: usize,
    pub checked: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    #[must_use]
    pub fn totals(&self) -> BatchTotals {
        let mut t = BatchTotals::default();
        for r in &self.records {
            match r.outcome {
                RecordOutcome::Migrated { .. } => t.migrated += 1,
                RecordOutcome::Checked { .. } => t.checked += 1,
                RecordOutcome::Skipped(_) => t.skipped += 1,
                RecordOutcome::Failed { .. } => t.failed += 1,
            }
        }
        t
    }
}
