//! Fault-log CSV ingestion
//!
//! Columns are located by header name, so extra columns and any column order
//! are fine. Rows that fail validation are skipped and reported; a run is only
//! aborted when the input as a whole is unusable (unreadable stream, missing
//! required header).

use crate::config::ColumnNames;
use crate::error::{ReportError, Result};
use crate::record::{
    FaultRecord, MalformedRecord, SkippedRow, FIELD_CODE, FIELD_DESCRIPTION, FIELD_DURATION,
    FIELD_MACHINE, FIELD_OCCURRENCES, FIELD_STATION,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Records and rejected rows from one input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub records: Vec<FaultRecord>,
    pub skipped: Vec<SkippedRow>,
    /// Data rows seen, header excluded
    pub rows_read: usize,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    machine: usize,
    station_state: usize,
    fault_code: usize,
    fault_description: usize,
    total_duration: usize,
    total_occurrences: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, names: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            machine: find(names.machine.as_str())?,
            station_state: find(names.station_state.as_str())?,
            fault_code: find(names.fault_code.as_str())?,
            fault_description: find(names.fault_description.as_str())?,
            total_duration: find(names.total_duration.as_str())?,
            total_occurrences: find(names.total_occurrences.as_str())?,
        })
    }

    fn parse(&self, row: &csv::StringRecord) -> std::result::Result<FaultRecord, MalformedRecord> {
        let cell = |idx: usize, field: &'static str| {
            row.get(idx).ok_or(MalformedRecord::MissingField { field })
        };

        FaultRecord::from_text(
            cell(self.machine, FIELD_MACHINE)?,
            cell(self.station_state, FIELD_STATION)?,
            cell(self.fault_code, FIELD_CODE)?,
            cell(self.fault_description, FIELD_DESCRIPTION)?,
            cell(self.total_duration, FIELD_DURATION)?,
            cell(self.total_occurrences, FIELD_OCCURRENCES)?,
        )
    }
}

/// Read fault records from CSV text
///
/// # Errors
/// [`ReportError::MissingColumn`] when a configured header is absent, and
/// I/O errors from the underlying reader. Bad rows are not errors; they are
/// returned in [`IngestOutcome::skipped`].
pub fn read_records<R: Read>(reader: R, columns: &ColumnNames) -> Result<IngestOutcome> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut outcome = IngestOutcome::default();
    let mut row = csv::StringRecord::new();

    loop {
        let line = csv_reader.position().line() + 1;
        match csv_reader.read_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {
                outcome.rows_read += 1;
                let line = row.position().map(|p| p.line()).unwrap_or(line);
                match index.parse(&row) {
                    Ok(record) => outcome.records.push(record),
                    Err(reason) => {
                        let machine = row
                            .get(index.machine)
                            .map(str::trim)
                            .filter(|m| !m.is_empty())
                            .map(str::to_string);
                        tracing::warn!(line, reason = %reason, "skipping malformed row");
                        outcome.skipped.push(SkippedRow {
                            line,
                            machine,
                            reason,
                        });
                    }
                }
            }
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                outcome.rows_read += 1;
                let line = err.position().map(|p| p.line()).unwrap_or(line);
                tracing::warn!(line, error = %err, "skipping unreadable row");
                outcome.skipped.push(SkippedRow {
                    line,
                    machine: None,
                    reason: MalformedRecord::Unreadable {
                        detail: err.to_string(),
                    },
                });
            }
        }
    }

    tracing::info!(
        rows = outcome.rows_read,
        records = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "fault log ingested"
    );

    Ok(outcome)
}

/// Open `path` and read fault records from it
pub fn read_records_from_path<P: AsRef<Path>>(
    path: P,
    columns: &ColumnNames,
) -> Result<IngestOutcome> {
    let file = File::open(path.as_ref())?;
    read_records(BufReader::new(file), columns)
}
