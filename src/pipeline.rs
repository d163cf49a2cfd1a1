//! End-to-end report run: aggregate, rank, summarize, assemble
//!
//! A run is all-or-nothing: either a complete [`ReportModel`] comes back or an
//! assembly inconsistency stops it. Rejected input rows never stop a run;
//! they are carried alongside the model so the caller can report them.

use crate::aggregate::{Aggregation, FaultAggregator};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::ingest::IngestOutcome;
use crate::rank::{rank, Metric, RankedList};
use crate::record::{FaultRecord, SkippedRow};
use crate::report::{assemble, ReportModel};
use crate::station::StationSummaryBuilder;
use serde::Serialize;
use std::collections::BTreeMap;

/// Count of rejected rows, total and per reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipSummary {
    pub total: usize,
    pub by_reason: BTreeMap<&'static str, usize>,
}

impl SkipSummary {
    pub fn from_rows(rows: &[SkippedRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total += 1;
            *summary.by_reason.entry(row.reason.kind()).or_default() += 1;
        }
        summary
    }
}

/// Output of one report run
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    pub model: ReportModel,
    pub skipped: Vec<SkippedRow>,
    /// Data rows in the input
    pub rows_read: usize,
    /// Rows that made it into the report
    pub records_used: usize,
}

impl ReportRun {
    pub fn skip_summary(&self) -> SkipSummary {
        SkipSummary::from_rows(&self.skipped)
    }
}

/// Rank every machine's faults both ways
pub fn rank_machines(
    aggregation: &Aggregation,
    top_n: usize,
) -> BTreeMap<String, (RankedList, RankedList)> {
    aggregation
        .machines()
        .iter()
        .map(|(machine, faults)| {
            (
                machine.clone(),
                (
                    rank(faults, Metric::Duration, top_n),
                    rank(faults, Metric::Occurrence, top_n),
                ),
            )
        })
        .collect()
}

fn build<'a>(
    records: &[FaultRecord],
    known_machines: impl IntoIterator<Item = &'a str>,
    config: &ReportConfig,
) -> Result<ReportModel> {
    config.validate()?;

    let mut aggregator = FaultAggregator::new();
    let mut stations = StationSummaryBuilder::new(config.unknown_station.clone());
    for machine in known_machines {
        aggregator.register_machine(machine);
    }
    for record in records {
        aggregator.record(record);
        stations.record(record);
    }

    let aggregation = aggregator.finish();
    if aggregation.skipped() > 0 {
        tracing::warn!(
            skipped = aggregation.skipped(),
            "records without machine left out of the report"
        );
    }

    let per_machine = rank_machines(&aggregation, config.top_n);
    let station_summary = stations.finish();
    assemble(&per_machine, &station_summary, config)
}

/// Build the report model for already-validated records
pub fn build_report(records: &[FaultRecord], config: &ReportConfig) -> Result<ReportModel> {
    build(records, std::iter::empty(), config)
}

/// Build the report for an ingested fault log
///
/// Machines that only appear on rejected rows are still known to the
/// assembler, which applies the configured empty-machine policy to them.
pub fn run(outcome: IngestOutcome, config: &ReportConfig) -> Result<ReportRun> {
    let known = outcome.skipped.iter().filter_map(|row| row.machine.as_deref());
    let model = build(&outcome.records, known, config)?;

    tracing::info!(
        rows = outcome.rows_read,
        used = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "report run complete"
    );

    Ok(ReportRun {
        model,
        records_used: outcome.records.len(),
        rows_read: outcome.rows_read,
        skipped: outcome.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyMachinePolicy;
    use crate::error::ReportError;
    use crate::record::MalformedRecord;
    use crate::report::{Sheet, SummaryKind};

    fn rec(machine: &str, station: &str, code: &str, desc: &str, dur: f64, occ: u64) -> FaultRecord {
        FaultRecord::new(machine, station, code, desc, dur, occ).unwrap()
    }

    fn skipped(line: u64, machine: &str) -> SkippedRow {
        SkippedRow {
            line,
            machine: Some(machine.to_string()),
            reason: MalformedRecord::NonNumeric {
                field: "total_duration",
                value: "abc".to_string(),
            },
        }
    }

    #[test]
    fn test_build_report_example_scenario() {
        let records = vec![
            rec("M1", "S1", "C1", "Overheat", 120.0, 3),
            rec("M1", "S1", "C1", "Overheat", 30.0, 1),
            rec("M1", "S2", "C2", "Jam", 50.0, 5),
        ];

        let model = build_report(&records, &ReportConfig::default()).unwrap();
        let sheet = model.machine_sheets().next().unwrap();

        let by_duration: Vec<_> = sheet
            .top_by_duration
            .iter()
            .map(|f| (f.fault_description.as_str(), f.total_duration))
            .collect();
        assert_eq!(by_duration, vec![("Overheat", 150.0), ("Jam", 50.0)]);

        let by_occurrence: Vec<_> = sheet
            .top_by_occurrence
            .iter()
            .map(|f| (f.fault_description.as_str(), f.total_occurrences))
            .collect();
        assert_eq!(by_occurrence, vec![("Jam", 5), ("Overheat", 4)]);
    }

    #[test]
    fn test_build_report_respects_top_n() {
        let records: Vec<_> = (0..20)
            .map(|i| rec("M1", "S1", "C", &format!("Fault {:02}", i), i as f64, 20 - i))
            .collect();
        let config = ReportConfig {
            top_n: 3,
            ..ReportConfig::default()
        };

        let model = build_report(&records, &config).unwrap();
        let sheet = model.machine_sheets().next().unwrap();
        assert_eq!(sheet.top_by_duration.len(), 3);
        assert_eq!(sheet.top_by_occurrence.len(), 3);
        assert_eq!(sheet.top_by_duration.entries[0].fault_description, "Fault 19");
        assert_eq!(sheet.top_by_occurrence.entries[0].fault_description, "Fault 00");
    }

    #[test]
    fn test_build_report_rejects_invalid_config() {
        let config = ReportConfig {
            top_n: 0,
            ..ReportConfig::default()
        };
        let err = build_report(&[], &config).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_empty_input_yields_summary_sheets_only() {
        let report = run(IngestOutcome::default(), &ReportConfig::default()).unwrap();
        assert_eq!(report.model.machine_sheets().count(), 0);
        assert_eq!(report.model.sheets.len(), 3);
        assert_eq!(report.skip_summary(), SkipSummary::default());
    }

    #[test]
    fn test_machine_with_only_bad_rows_omitted() {
        let outcome = IngestOutcome {
            records: vec![rec("M1", "S1", "C1", "Jam", 5.0, 1)],
            skipped: vec![skipped(3, "Ghost")],
            rows_read: 2,
        };

        let report = run(outcome, &ReportConfig::default()).unwrap();
        assert!(report.model.sheet("Ghost").is_none());
        let index = report.model.summary(SummaryKind::Index).unwrap();
        assert_eq!(index.table.rows.len(), 1);
    }

    #[test]
    fn test_machine_with_only_bad_rows_placeholder() {
        let outcome = IngestOutcome {
            records: vec![rec("M1", "S1", "C1", "Jam", 5.0, 1)],
            skipped: vec![skipped(3, "Ghost"), skipped(4, "Ghost")],
            rows_read: 3,
        };
        let config = ReportConfig {
            empty_machines: EmptyMachinePolicy::Placeholder,
            ..ReportConfig::default()
        };

        let report = run(outcome, &config).unwrap();
        match report.model.sheet("Ghost") {
            Some(Sheet::Machine(sheet)) => assert!(sheet.is_empty()),
            other => panic!("expected placeholder sheet, got {:?}", other),
        }
        assert_eq!(report.model.summary(SummaryKind::Index).unwrap().table.rows.len(), 2);
    }

    #[test]
    fn test_run_counts() {
        let outcome = IngestOutcome {
            records: vec![
                rec("M1", "S1", "C1", "Jam", 5.0, 1),
                rec("M2", "S1", "C1", "Jam", 5.0, 1),
            ],
            skipped: vec![skipped(2, "M1")],
            rows_read: 3,
        };

        let report = run(outcome, &ReportConfig::default()).unwrap();
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.records_used, 2);

        let summary = report.skip_summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.by_reason.get("non_numeric"), Some(&1));
    }

    #[test]
    fn test_unknown_station_label_from_config() {
        let records = vec![rec("M1", "", "C1", "Jam", 5.0, 1)];
        let config = ReportConfig {
            unknown_station: "No Station".to_string(),
            ..ReportConfig::default()
        };

        let model = build_report(&records, &config).unwrap();
        let totals = model.summary(SummaryKind::TotalDuration).unwrap();
        assert_eq!(totals.table.rows[0][0].display(), "No Station");
    }

    #[test]
    fn test_duration_overflow_fails_run() {
        let records = vec![
            rec("M1", "S1", "C1", "Jam", 1e308, 1),
            rec("M1", "S1", "C1", "Jam", 1e308, 1),
        ];

        let err = build_report(&records, &ReportConfig::default()).unwrap_err();
        match err {
            ReportError::TotalOverflow { scope, name } => {
                assert_eq!(scope, "machine");
                assert_eq!(name, "M1");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_station_overflow_across_machines_fails_run() {
        let records = vec![
            rec("M1", "S1", "C1", "Jam", 1e308, 1),
            rec("M2", "S1", "C1", "Jam", 1e308, 1),
        ];

        let err = build_report(&records, &ReportConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::TotalOverflow { scope: "station", .. }
        ));
    }
}
