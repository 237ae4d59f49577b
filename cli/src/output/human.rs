//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::domain::outcome::BatchTotals;
use crate::domain::{BatchReport, MigrateConfig, RecordOutcome};
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("az-zone-migrate {version}");
    }

    /// Render one line per record followed by the totals.
    pub fn render_report(&self, report: &BatchReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        let title = if report.check_only {
            "Zone check summary"
        } else {
            "Migration summary"
        };
        self.ctx.header(title);
        println!();
        if report.records.is_empty() {
            self.ctx.info("No records in input.");
            return;
        }
        for entry in &report.records {
            let (label, detail) = outcome_cell(&entry.outcome);
            let style = self.ctx.styles.outcome(&entry.outcome);
            let vm = format!(
                "{}/{}",
                entry.record.source_resource_group, entry.record.source_vm
            );
            println!("  {:<10} {vm:<40} {detail}", label.style(style));
        }
        println!();
        self.ctx
            .kv("Total:", &summary_line(report.totals(), report.check_only));
        println!();
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &MigrateConfig, path: &std::path::Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in crate::domain::config::VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_default();
            println!("  {:<28} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [CONFIG_ENV, "AZURE_SUBSCRIPTION_ID", "NO_COLOR"] {
            println!(
                "    {:<26} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

/// Short label and detail text for one outcome.
#[must_use]
pub fn outcome_cell(outcome: &RecordOutcome) -> (&'static str, String) {
    match outcome {
        RecordOutcome::Migrated { zone } => ("migrated", format!("now in zone {zone}")),
        RecordOutcome::Checked {
            zones,
            needs_migration,
            sku_available,
        } => {
            let zones = if zones.is_empty() {
                "no zone".to_string()
            } else {
                format!("zones [{}]", zones.join(", "))
            };
            let action = if *needs_migration {
                "needs migration"
            } else {
                "already in desired zone"
            };
            let capacity = match sku_available {
                Some(true) => ", size available",
                Some(false) => ", size NOT available",
                None => "",
            };
            ("checked", format!("{zones}, {action}{capacity}"))
        }
        RecordOutcome::Skipped(reason) => ("skipped", reason.to_string()),
        RecordOutcome::Failed { stage, reason } => ("failed", format!("at {stage}: {reason}")),
    }
}

/// `"2 migrated, 1 skipped, 0 failed"` (or `checked` in check-only runs).
#[must_use]
pub fn summary_line(totals: BatchTotals, check_only: bool) -> String {
    let done = if check_only {
        format!("{} checked", totals.checked)
    } else {
        format!("{} migrated", totals.migrated)
    };
    format!("{done}, {} skipped, {} failed", totals.skipped, totals.failed)
}
