//! Terminal styles keyed by what the text reports.

use owo_colors::Style;

use crate::domain::RecordOutcome;

/// Colours of the human renderer. Every style is plain until `colorize`.
#[derive(Default, Clone)]
pub struct Styles {
    /// Migrated records and applied settings.
    pub done: Style,
    /// Skipped records and sizes that are not offered.
    pub attention: Style,
    /// Failed records.
    pub failed: Style,
    /// Check-only results and notices.
    pub note: Style,
    pub dim: Style,
    pub bold: Style,
    pub header: Style,
}

impl Styles {
    /// Switch every style to its terminal colour.
    pub fn colorize(&mut self) {
        self.done = Style::new().green();
        self.attention = Style::new().yellow();
        self.failed = Style::new().red().bold();
        self.note = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }

    /// Style of the label printed for `outcome`.
    #[must_use]
    pub fn outcome(&self, outcome: &RecordOutcome) -> Style {
        match outcome {
            RecordOutcome::Migrated { .. } => self.done,
            RecordOutcome::Checked {
                sku_available: Some(false),
                ..
            }
            | RecordOutcome::Skipped(_) => self.attention,
            RecordOutcome::Checked { .. } => self.note,
            RecordOutcome::Failed { .. } => self.failed,
        }
    }
}
