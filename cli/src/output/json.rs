//! JSON output helpers.
//!
//! `format_error` is the error object printed by every `--json` code path when
//! a command fails. `JsonRenderer` prints successful results.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{BatchReport, ConfigError, CredentialError, MigrateConfig, RecordError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code for a run-level failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if cause.is::<CredentialError>() {
            return "CREDENTIAL_ERROR";
        }
        if cause.is::<RecordError>() || cause.is::<csv::Error>() {
            return "INPUT_ERROR";
        }
        if cause.is::<ConfigError>() {
            return "CONFIG_ERROR";
        }
    }
    "ERROR"
}

/// Renders results as pretty-printed JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Render the batch report with its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_report(&self, report: &BatchReport) -> Result<()> {
        #[derive(Serialize)]
        struct Out<'a> {
            #[serde(flatten)]
            report: &'a BatchReport,
            totals: crate::domain::outcome::BatchTotals,
        }
        print_json(&Out {
            report,
            totals: report.totals(),
        })
    }

    /// Render the configuration and where it was loaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &MigrateConfig, path: &std::path::Path) -> Result<()> {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print_json(&serde_json::json!({ "version": version }))
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}
