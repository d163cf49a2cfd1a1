//! faultrank - per-machine fault ranking reports
//!
//! Reads a fault log whose rows are already summed per (machine, fault),
//! aggregates them by machine and fault description, ranks the top faults by
//! duration and by occurrence count, summarizes faults and durations per
//! station, and assembles everything into a renderer-agnostic report model.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod html_output;
pub mod ingest;
pub mod json_output;
pub mod pipeline;
pub mod rank;
pub mod record;
pub mod report;
pub mod station;
