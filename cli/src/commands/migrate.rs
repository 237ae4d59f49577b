//! `az-zone-migrate migrate` / `check`: run the batch over a CSV sheet.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, CredentialProvider, RecordSource};
use crate::application::services::migration::{MigrationSettings, RunMode, run_batch};
use crate::application::services::operation::PollSettings;
use crate::domain::MigrationRecord;
use crate::infra::arm::ArmClient;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::credential::{AzCliCredential, TokenCache};
use crate::infra::csv_source::CsvRecordSource;
use crate::infra::recovery::JsonRecoveryStore;

/// Subscription and input sheet shared by `migrate` and `check`.
#[derive(Args)]
pub struct InputArgs {
    /// Azure subscription ID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: String,

    /// CSV file listing the VMs to migrate
    #[arg(long)]
    pub csv_file: PathBuf,
}

/// Arguments for `migrate`.
#[derive(Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only inspect and report, never snapshot, delete or create
    #[arg(long)]
    pub check: bool,
}

/// Run a migration (or check-only) batch.
///
/// The sheet is parsed and the credential acquired before any record is
/// processed; failures there abort the run. Per-record outcomes never do.
///
/// # Errors
///
/// Returns an error if the configuration, the CSV sheet or the credential
/// cannot be loaded.
pub async fn run(app: &AppContext, input: &InputArgs, mode: RunMode) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    let records = CsvRecordSource::new(&input.csv_file).load()?;
    tracing::info!(
        "Loaded {} record(s) from {}",
        records.len(),
        input.csv_file.display()
    );

    if mode == RunMode::Migrate
        && !records.is_empty()
        && !app.non_interactive
        && !confirm_destructive(app, &records)?
    {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let credential = AzCliCredential::new(TokioCommandRunner::default(), &config.azure.endpoint);
    let token = credential.access_token(&input.subscription_id).await?;
    let tokens = TokenCache::new(credential, &input.subscription_id, token);
    let client = ArmClient::new(&config.azure, &config.retry, &input.subscription_id, tokens)?;
    let recovery = JsonRecoveryStore::new(config.recovery.dir.clone())?;
    let settings = MigrationSettings {
        mode,
        poll: PollSettings::from(&config.polling),
        default_snapshot_sku: config.snapshot.default_sku.clone(),
    };

    let report = run_batch(&client, &recovery, &records, &settings).await;
    app.renderer().render_report(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn confirm_destructive(app: &AppContext, records: &[MigrationRecord]) -> Result<bool> {
    eprintln!();
    eprintln!("The following VMs will be snapshotted, DELETED and recreated:");
    for r in records {
        eprintln!(
            "  {}/{} -> {}/{} (zone {})",
            r.source_resource_group,
            r.source_vm,
            r.desired_resource_group,
            r.desired_vm,
            r.desired_zone
        );
    }
    eprintln!();
    app.confirm("Continue?", false)
}
