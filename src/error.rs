//! Error types for report generation
//!
//! Row-level data problems are not errors: they are collected as
//! [`crate::record::SkippedRow`] values and the run continues. Only failures
//! that make the whole run meaningless end up here.

use thiserror::Error;

/// Errors that can abort a report run
#[derive(Error, Debug)]
pub enum ReportError {
    /// An aggregation invariant broke before assembly (duplicate fault key,
    /// unsorted or oversized ranked list, list filed under the wrong machine)
    #[error("Assembly inconsistency for machine '{machine}': {detail}")]
    AssemblyInconsistency { machine: String, detail: String },

    /// A summed duration left the finite range of `f64`
    #[error("Total duration overflow for {scope} '{name}'")]
    TotalOverflow { scope: &'static str, name: String },

    #[error("Required column missing from input header: {0}")]
    MissingColumn(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
