//! Unit tests for az-zone-migrate
//!
//! These tests run against in-process fakes and need no Azure access.

mod architecture;
mod fake_arm;
