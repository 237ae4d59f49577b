//! Infrastructure implementation of the `RecordSource` port for CSV sheets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::RecordSource;
use crate::domain::record::REQUIRED_COLUMNS;
use crate::domain::{MigrationRecord, RecordError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads migration records from a CSV file with the sheet's header row.
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&self) -> Result<Vec<MigrationRecord>> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        parse_records(bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes))
            .with_context(|| format!("invalid migration sheet {}", self.path.display()))
    }
}

/// Parse a whole sheet. The first malformed row fails the load.
///
/// # Errors
///
/// Returns `RecordError` for a missing column or an empty field, or a CSV
/// error for unreadable input.
pub fn parse_records(input: &[u8]) -> Result<Vec<MigrationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers().context("cannot read header row")?.clone();
    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == *column)
            .ok_or_else(|| RecordError::MissingColumn((*column).to_string()))?;
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = row.with_context(|| format!("cannot read row {row_no}"))?;
        let fields = index.map(|col| row.get(col).unwrap_or(""));
        records.push(MigrationRecord::from_fields(row_no, fields)?);
    }
    tracing::debug!(count = records.len(), "loaded migration records");
    Ok(records)
}
