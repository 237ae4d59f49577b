//! Application services: use-case orchestration.
//!
//! Each service module implements one stage of a migration by composing domain
//! logic with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod capacity;
pub mod inspector;
pub mod migration;
pub mod operation;
pub mod recreate;
pub mod snapshot;
pub mod teardown;
