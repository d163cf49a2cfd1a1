//! Report document model and its assembler
//!
//! The assembler turns per-machine rankings and station summaries into an
//! ordered list of named sheets. Every sheet carries plain table data and a
//! declarative chart description; fonts, zoom and actual drawing are left to
//! whichever renderer consumes the model.

use crate::config::{EmptyMachinePolicy, ReportConfig};
use crate::error::{ReportError, Result};
use crate::rank::{Metric, RankedList};
use crate::station::StationSummary;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub const INDEX_SHEET: &str = "Index";
pub const UNIQUE_FAULTS_SHEET: &str = "Unique Faults";
pub const TOTAL_DURATION_SHEET: &str = "Total Duration";

/// Characters spreadsheet applications refuse in sheet names
static INVALID_SHEET_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\\/*?\[\]:]").expect("sheet name pattern is a valid regex")
});

/// One table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(u64),
    /// Text that links to another sheet of the same report
    Link { text: String, sheet: String },
}

impl Cell {
    /// Plain-text rendering of the cell value
    pub fn display(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => value.to_string(),
            Cell::Integer(value) => value.to_string(),
            Cell::Link { text, .. } => text.clone(),
        }
    }
}

/// Titled grid of cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
}

/// What a renderer should draw, without saying how
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub metric: Metric,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fault labels, ellipsized for display
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

/// Sheet for one machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSheet {
    /// Sanitized, unique sheet name
    pub name: String,
    pub machine: String,
    pub top_by_duration: RankedList,
    pub top_by_occurrence: RankedList,
    /// Duration chart first, occurrence chart second
    pub charts: Vec<ChartSpec>,
}

impl MachineSheet {
    /// The two ranking tables, duration first
    pub fn tables(&self) -> [Table; 2] {
        [
            ranking_table(&self.top_by_duration),
            ranking_table(&self.top_by_occurrence),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.top_by_duration.is_empty() && self.top_by_occurrence.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Index,
    UniqueFaults,
    TotalDuration,
}

/// Cross-machine sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySheet {
    /// Sheet name; serialized under the same key as machine sheet names
    #[serde(rename = "name")]
    pub title: String,
    pub kind: SummaryKind,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "sheet", rename_all = "snake_case")]
pub enum Sheet {
    Machine(MachineSheet),
    Summary(SummarySheet),
}

impl Sheet {
    pub fn name(&self) -> &str {
        match self {
            Sheet::Machine(sheet) => &sheet.name,
            Sheet::Summary(sheet) => &sheet.title,
        }
    }
}

/// Complete report content, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportModel {
    /// Machine sheets by machine name, then the summary sheets
    pub sheets: Vec<Sheet>,
    /// Sheet to show first when the report is opened
    pub active_sheet: String,
    /// Zoom percentage hint
    pub display_zoom: u16,
}

impl ReportModel {
    pub fn machine_sheets(&self) -> impl Iterator<Item = &MachineSheet> {
        self.sheets.iter().filter_map(|sheet| match sheet {
            Sheet::Machine(machine) => Some(machine),
            Sheet::Summary(_) => None,
        })
    }

    pub fn summary(&self, kind: SummaryKind) -> Option<&SummarySheet> {
        self.sheets.iter().find_map(|sheet| match sheet {
            Sheet::Summary(summary) if summary.kind == kind => Some(summary),
            _ => None,
        })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }
}

/// Strip characters spreadsheets reject and cap the length
pub fn sanitize_sheet_name(name: &str, max_chars: usize) -> String {
    let cleaned = INVALID_SHEET_CHARS.replace_all(name, "");
    let truncated: String = cleaned.trim().chars().take(max_chars).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        "Sheet".chars().take(max_chars).collect()
    } else {
        truncated.to_string()
    }
}

/// Shorten `label` to at most `max_chars` characters, marking the cut with `…`
pub fn ellipsize(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Hands out unique sheet names; comparison ignores case like spreadsheets do
#[derive(Debug)]
struct SheetNamer {
    used: BTreeSet<String>,
    max_chars: usize,
}

impl SheetNamer {
    fn new(max_chars: usize) -> Self {
        let mut namer = Self {
            used: BTreeSet::new(),
            max_chars,
        };
        for reserved in [INDEX_SHEET, UNIQUE_FAULTS_SHEET, TOTAL_DURATION_SHEET] {
            namer.used.insert(reserved.to_lowercase());
        }
        namer
    }

    fn assign(&mut self, machine: &str) -> Result<String> {
        let base = sanitize_sheet_name(machine, self.max_chars);
        if self.used.insert(base.to_lowercase()) {
            return Ok(base);
        }

        let mut n = 2usize;
        loop {
            let suffix = format!("~{}", n);
            let suffix_len = suffix.chars().count();
            if suffix_len > self.max_chars {
                return Err(ReportError::Config(format!(
                    "no unique sheet name within {} characters for machine '{}'",
                    self.max_chars, machine
                )));
            }
            let stem: String = base.chars().take(self.max_chars - suffix_len).collect();
            let candidate = format!("{}{}", stem.trim_end(), suffix);
            if self.used.insert(candidate.to_lowercase()) {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

fn ranking_table(list: &RankedList) -> Table {
    let title = format!("{} (Top {})", list.metric.column_name(), list.limit);
    let columns = vec![
        "Rank".to_string(),
        "Fault Description".to_string(),
        "Fault Code".to_string(),
        Metric::Duration.column_name().to_string(),
        Metric::Occurrence.column_name().to_string(),
    ];
    let rows = list
        .iter()
        .enumerate()
        .map(|(i, fault)| {
            vec![
                Cell::Integer(i as u64 + 1),
                Cell::Text(fault.fault_description.clone()),
                Cell::Text(fault.fault_codes.join("/")),
                Cell::Number(fault.total_duration),
                Cell::Integer(fault.total_occurrences),
            ]
        })
        .collect();

    Table {
        title,
        columns,
        rows,
    }
}

fn chart_for(list: &RankedList, sheet_name: &str, label_max_chars: usize) -> ChartSpec {
    let title = match list.metric {
        Metric::Duration => format!("Top {} Durations for {}", list.limit, sheet_name),
        Metric::Occurrence => format!("Top {} Occurrences for {}", list.limit, sheet_name),
    };

    ChartSpec {
        kind: ChartKind::Bar,
        metric: list.metric,
        title,
        x_label: "Fault Description".to_string(),
        y_label: list.metric.column_name().to_string(),
        categories: list
            .iter()
            .map(|fault| ellipsize(&fault.label(), label_max_chars))
            .collect(),
        values: list.iter().map(|fault| list.metric.value(fault)).collect(),
    }
}

fn check_rankings(
    machine: &str,
    by_duration: &RankedList,
    by_occurrence: &RankedList,
) -> Result<()> {
    let inconsistency = |detail: String| ReportError::AssemblyInconsistency {
        machine: machine.to_string(),
        detail,
    };

    if by_duration.metric != Metric::Duration {
        return Err(inconsistency(format!(
            "duration slot holds a {:?} ranking",
            by_duration.metric
        )));
    }
    if by_occurrence.metric != Metric::Occurrence {
        return Err(inconsistency(format!(
            "occurrence slot holds a {:?} ranking",
            by_occurrence.metric
        )));
    }
    by_duration.verify(machine).map_err(inconsistency)?;
    by_occurrence.verify(machine).map_err(inconsistency)?;
    Ok(())
}

fn check_finite_totals(
    machine: &str,
    by_duration: &RankedList,
    by_occurrence: &RankedList,
) -> Result<()> {
    let overflowed = by_duration
        .iter()
        .chain(by_occurrence.iter())
        .any(|fault| !fault.total_duration.is_finite());
    if overflowed {
        return Err(ReportError::TotalOverflow {
            scope: "machine",
            name: machine.to_string(),
        });
    }
    Ok(())
}

fn index_sheet(machine_sheets: &[MachineSheet]) -> SummarySheet {
    let rows = machine_sheets
        .iter()
        .map(|sheet| {
            vec![
                Cell::Text(sheet.machine.clone()),
                Cell::Link {
                    text: sheet.name.clone(),
                    sheet: sheet.name.clone(),
                },
            ]
        })
        .collect();

    SummarySheet {
        title: INDEX_SHEET.to_string(),
        kind: SummaryKind::Index,
        table: Table {
            title: INDEX_SHEET.to_string(),
            columns: vec!["Machine Name".to_string(), "Sheet Name".to_string()],
            rows,
        },
    }
}

fn unique_faults_sheet(summary: &StationSummary) -> SummarySheet {
    let rows = summary
        .unique_faults_by_station
        .iter()
        .flat_map(|(station, faults)| {
            faults
                .iter()
                .map(move |fault| vec![Cell::Text(station.clone()), Cell::Text(fault.clone())])
        })
        .collect();

    SummarySheet {
        title: UNIQUE_FAULTS_SHEET.to_string(),
        kind: SummaryKind::UniqueFaults,
        table: Table {
            title: "Unique Faults per Station".to_string(),
            columns: vec!["Station".to_string(), "Fault Description".to_string()],
            rows,
        },
    }
}

fn total_duration_sheet(summary: &StationSummary) -> SummarySheet {
    let rows = summary
        .total_duration_by_station
        .iter()
        .map(|total| {
            vec![
                Cell::Text(total.station.clone()),
                Cell::Number(total.total_duration),
            ]
        })
        .collect();

    SummarySheet {
        title: TOTAL_DURATION_SHEET.to_string(),
        kind: SummaryKind::TotalDuration,
        table: Table {
            title: "Total Duration per Station".to_string(),
            columns: vec!["Station".to_string(), "Total Duration".to_string()],
            rows,
        },
    }
}

/// Build the report from per-machine rankings and station summaries
///
/// `per_machine` maps each machine to its `(by_duration, by_occurrence)`
/// rankings. Machine sheets come out in machine-name order followed by the
/// index, unique-faults and total-duration sheets.
///
/// # Errors
/// Returns [`ReportError::AssemblyInconsistency`] when a ranking breaks its
/// invariants (duplicate fault, wrong order, over the limit, wrong metric or
/// wrong machine), [`ReportError::TotalOverflow`] when a machine or station
/// total is not finite, and [`ReportError::Config`] when the sheet name limit
/// leaves no room for another unique name. No partial model is returned.
pub fn assemble(
    per_machine: &BTreeMap<String, (RankedList, RankedList)>,
    station_summary: &StationSummary,
    config: &ReportConfig,
) -> Result<ReportModel> {
    let mut namer = SheetNamer::new(config.sheet_name_max_chars);
    let mut machine_sheets = Vec::with_capacity(per_machine.len());

    for (machine, (by_duration, by_occurrence)) in per_machine {
        check_rankings(machine, by_duration, by_occurrence)?;
        check_finite_totals(machine, by_duration, by_occurrence)?;

        if by_duration.is_empty()
            && by_occurrence.is_empty()
            && config.empty_machines == EmptyMachinePolicy::Omit
        {
            tracing::debug!(machine = %machine, "omitting machine without faults");
            continue;
        }

        let name = namer.assign(machine)?;
        let charts = vec![
            chart_for(by_duration, &name, config.label_max_chars),
            chart_for(by_occurrence, &name, config.label_max_chars),
        ];
        machine_sheets.push(MachineSheet {
            name,
            machine: machine.clone(),
            top_by_duration: by_duration.clone(),
            top_by_occurrence: by_occurrence.clone(),
            charts,
        });
    }

    if let Some(total) = station_summary
        .total_duration_by_station
        .iter()
        .find(|total| !total.total_duration.is_finite())
    {
        return Err(ReportError::TotalOverflow {
            scope: "station",
            name: total.station.clone(),
        });
    }

    let index = index_sheet(&machine_sheets);
    let mut sheets: Vec<Sheet> = machine_sheets.into_iter().map(Sheet::Machine).collect();
    sheets.push(Sheet::Summary(index));
    sheets.push(Sheet::Summary(unique_faults_sheet(station_summary)));
    sheets.push(Sheet::Summary(total_duration_sheet(station_summary)));

    tracing::debug!(sheets = sheets.len(), "report assembled");

    Ok(ReportModel {
        sheets,
        active_sheet: INDEX_SHEET.to_string(),
        display_zoom: config.display_zoom,
    })
}
