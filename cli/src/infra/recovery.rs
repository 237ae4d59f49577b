//! Infrastructure implementation of the `RecoveryStore` port.
//!
//! `JsonRecoveryStore` writes one JSON file per plan using
//! `tokio::task::spawn_blocking` and an atomic temp file + rename, so a crash
//! mid-write never leaves a truncated plan behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::RecoveryStore;
use crate::domain::RecoveryPlan;

/// Recovery plan directory. Implements `RecoveryStore` for the infra layer.
pub struct JsonRecoveryStore {
    dir: PathBuf,
}

impl JsonRecoveryStore {
    /// Use `dir` if configured, else `~/.az-zone-migrate/recovery`.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home directory
    /// cannot be determined.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        match dir {
            Some(dir) => Ok(Self::with_dir(dir)),
            None => Ok(Self::with_dir(super::config::app_dir()?.join("recovery"))),
        }
    }

    #[must_use]
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save_sync(dir: &Path, plan: &RecoveryPlan) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let path = dir.join(format!("{}.json", plan.file_stem()));
        let content = serde_json::to_string_pretty(plan).context("serializing recovery plan")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing recovery plan {}", path.display()))?;
        Ok(path)
    }
}

impl RecoveryStore for JsonRecoveryStore {
    async fn save(&self, plan: &RecoveryPlan) -> Result<PathBuf> {
        let dir = self.dir.clone();
        let plan = plan.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&dir, &plan))
            .await
            .context("recovery plan save task panicked")?
    }
}
