//! Integration tests for az-zone-migrate
//!
//! These tests spawn the actual binary and test end-to-end behavior.

mod config_command;
#[allow(dead_code)]
#[path = "../unit/fake_arm.rs"]
mod fake_arm;
mod migrate_command;
