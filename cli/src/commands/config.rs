//! `az-zone-migrate config`: show and set configuration values.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::domain::config::validate_config_key;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key, e.g. `polling.timeout_secs`
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, or the key or value
/// is invalid.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app, &app.config_store),
        ConfigCommand::Set { key, value } => set_config(app, &app.config_store, &key, &value),
    }
}

fn show_config(app: &AppContext, store: &impl ConfigStore) -> Result<ExitCode> {
    let config = store.load()?;
    let path = store.path()?;
    app.renderer().render_config(&config, &path)?;
    Ok(ExitCode::SUCCESS)
}

fn set_config(
    app: &AppContext,
    store: &impl ConfigStore,
    key: &str,
    value: &str,
) -> Result<ExitCode> {
    validate_config_key(key)?;
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    tracing::debug!(key, value, "configuration updated");
    app.output
        .success(&format!("Set {key} = {}", config.get(key)?));
    Ok(ExitCode::SUCCESS)
}
