//! CLI argument parsing for faultrank

use crate::config::{EmptyMachinePolicy, ReportConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single HTML document with tables and bar charts (default)
    Html,
    /// JSON document model for machine parsing
    Json,
    /// Directory with one CSV file per sheet
    Csv,
}

impl OutputFormat {
    /// Output location used when none is given
    pub fn default_output(self) -> PathBuf {
        match self {
            OutputFormat::Html => PathBuf::from("faults_per_machine.html"),
            OutputFormat::Json => PathBuf::from("faults_per_machine.json"),
            OutputFormat::Csv => PathBuf::from("faults_per_machine"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "faultrank")]
#[command(version)]
#[command(about = "Per-machine top fault report from a fault-log CSV", long_about = None)]
pub struct Cli {
    /// Fault log CSV to read
    #[arg(value_name = "INPUT", default_value = "faults.csv")]
    pub input: PathBuf,

    /// Output file (html/json) or directory (csv)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Entries per ranking (overrides config)
    #[arg(short = 'n', long = "top-n", value_name = "N")]
    pub top_n: Option<usize>,

    /// Longest chart label before ellipsizing (overrides config)
    #[arg(long = "label-max", value_name = "CHARS")]
    pub label_max: Option<usize>,

    /// Handling of machines without any valid rows (overrides config)
    #[arg(long = "empty-machines", value_enum)]
    pub empty_machines: Option<EmptyMachinePolicy>,

    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Output path, falling back to the format's default
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.format.default_output())
    }

    /// Apply command-line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut ReportConfig) {
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(label_max) = self.label_max {
            config.label_max_chars = label_max;
        }
        if let Some(policy) = self.empty_machines {
            config.empty_machines = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["faultrank"]);
        assert_eq!(cli.input, PathBuf::from("faults.csv"));
        assert_eq!(cli.format, OutputFormat::Html);
        assert!(cli.output.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.debug);
        assert_eq!(cli.output_path(), PathBuf::from("faults_per_machine.html"));
    }

    #[test]
    fn test_cli_parses_input_and_output() {
        let cli = Cli::parse_from(["faultrank", "log.csv", "-o", "out.json", "--format", "json"]);
        assert_eq!(cli.input, PathBuf::from("log.csv"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.output_path(), PathBuf::from("out.json"));
    }

    #[test]
    fn test_cli_csv_default_output_is_directory() {
        let cli = Cli::parse_from(["faultrank", "--format", "csv"]);
        assert_eq!(cli.output_path(), PathBuf::from("faults_per_machine"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "faultrank",
            "--top-n",
            "5",
            "--label-max",
            "20",
            "--empty-machines",
            "placeholder",
        ]);
        let mut config = ReportConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.top_n, 5);
        assert_eq!(config.label_max_chars, 20);
        assert_eq!(config.empty_machines, EmptyMachinePolicy::Placeholder);
    }

    #[test]
    fn test_cli_no_overrides_keeps_config() {
        let cli = Cli::parse_from(["faultrank"]);
        let mut config = ReportConfig {
            top_n: 7,
            ..ReportConfig::default()
        };
        cli.apply_overrides(&mut config);
        assert_eq!(config.top_n, 7);
        assert_eq!(config.empty_machines, EmptyMachinePolicy::Omit);
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["faultrank", "--empty-machines", "hide"]).is_err());
    }

    #[test]
    fn test_cli_debug_flag() {
        let cli = Cli::parse_from(["faultrank", "--debug"]);
        assert!(cli.debug);
    }
}
