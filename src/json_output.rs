//! JSON rendering of a report run

use crate::pipeline::{ReportRun, SkipSummary};
use crate::record::SkippedRow;
use crate::report::ReportModel;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Run-level counters
#[derive(Debug, Clone, Serialize)]
pub struct JsonRunSummary {
    pub rows_read: usize,
    pub records_used: usize,
    pub skipped: SkipSummary,
}

/// Versioned JSON envelope around the report model
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub format: String,
    pub summary: JsonRunSummary,
    pub report: ReportModel,
    /// Every rejected row with its line and reason
    pub skipped_rows: Vec<SkippedRow>,
}

impl JsonOutput {
    pub fn from_run(run: &ReportRun) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "faultrank-json-v1".to_string(),
            summary: JsonRunSummary {
                rows_read: run.rows_read,
                records_used: run.records_used,
                skipped: run.skip_summary(),
            },
            report: run.model.clone(),
            skipped_rows: run.skipped.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the pretty-printed document to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
