//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the Resource Manager REST
//! client, process execution for the Azure CLI, CSV input, and filesystem
//! persistence for configuration and recovery plans.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod arm;
pub mod command_runner;
pub mod config;
pub mod credential;
pub mod csv_source;
pub mod recovery;
