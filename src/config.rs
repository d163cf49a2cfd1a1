//! Report configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file at all) gives the standard report.
//!
//! # Example TOML
//! ```toml
//! top_n = 5
//! empty_machines = "placeholder"
//! unknown_station = "(no station)"
//!
//! [columns]
//! machine = "Machine"
//! total_duration = "Seconds"
//! ```

use crate::error::ReportError;
use crate::rank::DEFAULT_TOP_N;
use crate::station::DEFAULT_UNKNOWN_STATION;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do with machines that end up with no aggregated faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMachinePolicy {
    /// Leave the machine out of the sheets and the index
    #[default]
    Omit,
    /// Emit an empty machine sheet and list it in the index
    Placeholder,
}

/// Input header names for each required column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub machine: String,
    pub station_state: String,
    pub fault_code: String,
    pub fault_description: String,
    pub total_duration: String,
    pub total_occurrences: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            machine: "D_MachineName".to_string(),
            station_state: "D_StateDesc".to_string(),
            fault_code: "D_MsgCode".to_string(),
            fault_description: "D_MsgDesc".to_string(),
            total_duration: "T_TotalDuration".to_string(),
            total_occurrences: "T_TotalOccur".to_string(),
        }
    }
}

/// Settings for one report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Entries kept per ranking
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Longest chart category label before it is ellipsized
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,

    /// Longest sheet name
    #[serde(default = "default_sheet_name_max_chars")]
    pub sheet_name_max_chars: usize,

    /// Bucket for records without a station
    #[serde(default = "default_unknown_station")]
    pub unknown_station: String,

    #[serde(default)]
    pub empty_machines: EmptyMachinePolicy,

    /// Zoom percentage hint for renderers
    #[serde(default = "default_display_zoom")]
    pub display_zoom: u16,

    #[serde(default)]
    pub columns: ColumnNames,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_label_max_chars() -> usize {
    40
}

fn default_sheet_name_max_chars() -> usize {
    25
}

fn default_unknown_station() -> String {
    DEFAULT_UNKNOWN_STATION.to_string()
}

fn default_display_zoom() -> u16 {
    50
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            label_max_chars: default_label_max_chars(),
            sheet_name_max_chars: default_sheet_name_max_chars(),
            unknown_station: default_unknown_station(),
            empty_machines: EmptyMachinePolicy::default(),
            display_zoom: default_display_zoom(),
            columns: ColumnNames::default(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a meaningful report
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.top_n == 0 {
            return Err(ReportError::Config("top_n must be at least 1".to_string()));
        }
        // room for one character plus the ellipsis
        if self.label_max_chars < 2 {
            return Err(ReportError::Config(
                "label_max_chars must be at least 2".to_string(),
            ));
        }
        // room for a collision suffix such as "~12"
        if self.sheet_name_max_chars < 4 {
            return Err(ReportError::Config(
                "sheet_name_max_chars must be at least 4".to_string(),
            ));
        }
        if !(10..=400).contains(&self.display_zoom) {
            return Err(ReportError::Config(format!(
                "display_zoom must be between 10 and 400, got {}",
                self.display_zoom
            )));
        }
        if self.unknown_station.trim().is_empty() {
            return Err(ReportError::Config(
                "unknown_station must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
