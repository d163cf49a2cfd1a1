//! Typed fault-log records
//!
//! A [`FaultRecord`] is one row of the fault log, already summed upstream for
//! that row's key. Rows are validated here, at the ingestion boundary, so the
//! rest of the pipeline never sees untyped or half-parsed data.

use serde::Serialize;
use thiserror::Error;

/// Column identifiers used in validation messages
pub const FIELD_MACHINE: &str = "machine";
pub const FIELD_STATION: &str = "station_state";
pub const FIELD_CODE: &str = "fault_code";
pub const FIELD_DESCRIPTION: &str = "fault_description";
pub const FIELD_DURATION: &str = "total_duration";
pub const FIELD_OCCURRENCES: &str = "total_occurrences";

/// One validated fault-log row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRecord {
    /// Machine name (never empty once validated)
    pub machine: String,
    /// Station / state description, may be empty
    pub station_state: String,
    /// Message code, display only
    pub fault_code: String,
    /// Message description, the fault identity within a machine
    pub fault_description: String,
    /// Summed duration for this row (non-negative, finite)
    pub total_duration: f64,
    /// Summed occurrence count for this row
    pub total_occurrences: u64,
}

/// Grouping identity for per-machine aggregation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaultKey {
    pub machine: String,
    pub fault_description: String,
}

/// Why a row was rejected
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedRecord {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("empty machine name")]
    EmptyMachine,

    #[error("non-numeric {field}: '{value}'")]
    NonNumeric { field: &'static str, value: String },

    #[error("negative {field}: '{value}'")]
    Negative { field: &'static str, value: String },

    #[error("non-integral {field}: '{value}'")]
    NonIntegral { field: &'static str, value: String },

    #[error("unreadable row: {detail}")]
    Unreadable { detail: String },
}

impl MalformedRecord {
    /// Stable short name used for per-reason skip counts
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::EmptyMachine => "empty_machine",
            Self::NonNumeric { .. } => "non_numeric",
            Self::Negative { .. } => "negative",
            Self::NonIntegral { .. } => "non_integral",
            Self::Unreadable { .. } => "unreadable",
        }
    }
}

/// A rejected input row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the input, header included
    pub line: u64,
    /// Machine name on the row, when one was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    pub reason: MalformedRecord,
}

impl FaultRecord {
    /// Build a record from already-typed values
    pub fn new(
        machine: impl Into<String>,
        station_state: impl Into<String>,
        fault_code: impl Into<String>,
        fault_description: impl Into<String>,
        total_duration: f64,
        total_occurrences: u64,
    ) -> std::result::Result<Self, MalformedRecord> {
        let machine = machine.into().trim().to_string();
        if machine.is_empty() {
            return Err(MalformedRecord::EmptyMachine);
        }
        if !total_duration.is_finite() {
            return Err(MalformedRecord::NonNumeric {
                field: FIELD_DURATION,
                value: total_duration.to_string(),
            });
        }
        if total_duration < 0.0 {
            return Err(MalformedRecord::Negative {
                field: FIELD_DURATION,
                value: total_duration.to_string(),
            });
        }

        Ok(Self {
            machine,
            station_state: station_state.into().trim().to_string(),
            fault_code: fault_code.into().trim().to_string(),
            fault_description: fault_description.into().trim().to_string(),
            // folds -0.0 into 0.0
            total_duration: total_duration + 0.0,
            total_occurrences,
        })
    }

    /// Build a record from raw text cells
    ///
    /// Numbers are coerced the way the fault export writes them: surrounding
    /// whitespace is ignored and counts written as integral floats (`"3.0"`)
    /// are accepted.
    pub fn from_text(
        machine: &str,
        station_state: &str,
        fault_code: &str,
        fault_description: &str,
        total_duration: &str,
        total_occurrences: &str,
    ) -> std::result::Result<Self, MalformedRecord> {
        if machine.trim().is_empty() {
            return Err(MalformedRecord::EmptyMachine);
        }
        let duration = parse_duration(total_duration)?;
        let occurrences = parse_occurrences(total_occurrences)?;

        Self::new(
            machine,
            station_state,
            fault_code,
            fault_description,
            duration,
            occurrences,
        )
    }

    /// Grouping key of this record
    pub fn key(&self) -> FaultKey {
        FaultKey {
            machine: self.machine.clone(),
            fault_description: self.fault_description.clone(),
        }
    }
}

fn parse_duration(raw: &str) -> std::result::Result<f64, MalformedRecord> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(MalformedRecord::MissingField {
            field: FIELD_DURATION,
        });
    }

    let value: f64 = text.parse().map_err(|_| MalformedRecord::NonNumeric {
        field: FIELD_DURATION,
        value: text.to_string(),
    })?;

    if !value.is_finite() {
        return Err(MalformedRecord::NonNumeric {
            field: FIELD_DURATION,
            value: text.to_string(),
        });
    }
    if value < 0.0 {
        return Err(MalformedRecord::Negative {
            field: FIELD_DURATION,
            value: text.to_string(),
        });
    }
    Ok(value)
}

fn parse_occurrences(raw: &str) -> std::result::Result<u64, MalformedRecord> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(MalformedRecord::MissingField {
            field: FIELD_OCCURRENCES,
        });
    }

    if let Ok(count) = text.parse::<u64>() {
        return Ok(count);
    }

    let value: f64 = text.parse().map_err(|_| MalformedRecord::NonNumeric {
        field: FIELD_OCCURRENCES,
        value: text.to_string(),
    })?;

    if !value.is_finite() {
        return Err(MalformedRecord::NonNumeric {
            field: FIELD_OCCURRENCES,
            value: text.to_string(),
        });
    }
    if value < 0.0 {
        return Err(MalformedRecord::Negative {
            field: FIELD_OCCURRENCES,
            value: text.to_string(),
        });
    }
    // 2^53: beyond this an f64 no longer holds every integer exactly
    if value.fract() != 0.0 || value > 9_007_199_254_740_992.0 {
        return Err(MalformedRecord::NonIntegral {
            field: FIELD_OCCURRENCES,
            value: text.to_string(),
        });
    }
    Ok(value as u64)
}
