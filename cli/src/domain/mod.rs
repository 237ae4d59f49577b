//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod outcome;
pub mod record;
pub mod recovery;
pub mod snapshot;
pub mod vm;

pub use config::{MigrateConfig, validate_config_key, validate_config_value};
pub use error::{AttributeError, ConfigError, CredentialError, ProviderError, RecordError};
pub use outcome::{BatchReport, MigrationStage, RecordOutcome, RecordReport, SkipReason};
pub use record::{MigrationRecord, OsType};
pub use recovery::RecoveryPlan;
pub use vm::{AttachedDisk, DiskKind, DiskRef, MigrationPlan, VmSnapshot};
