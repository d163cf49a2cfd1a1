use anyhow::{Context, Result};
use clap::Parser;
use faultrank::cli::{Cli, OutputFormat};
use faultrank::config::ReportConfig;
use faultrank::csv_output::CsvSheetOutput;
use faultrank::html_output::HtmlOutput;
use faultrank::ingest;
use faultrank::json_output::JsonOutput;
use faultrank::pipeline::{self, ReportRun, SkipSummary};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn write_report(run: &ReportRun, format: OutputFormat, output: &Path) -> Result<()> {
    match format {
        OutputFormat::Json => JsonOutput::from_run(run)
            .write_to(output)
            .with_context(|| format!("Failed to write {}", output.display()))?,
        OutputFormat::Csv => {
            let files = CsvSheetOutput::new(output).write(&run.model)?;
            tracing::debug!(files = files.len(), "wrote sheet files");
        }
        OutputFormat::Html => {
            let summary = run.skip_summary();
            let html = HtmlOutput::new(&run.model)
                .with_skip_summary(&summary)
                .to_html();
            std::fs::write(output, html)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
    }
    Ok(())
}

fn print_skip_summary(summary: &SkipSummary) {
    if summary.total == 0 {
        return;
    }
    eprintln!("{} rows skipped", summary.total);
    for (reason, count) in &summary.by_reason {
        eprintln!("  {}: {}", reason, count);
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;

    let outcome = ingest::read_records_from_path(&args.input, &config.columns)
        .with_context(|| format!("Failed to read fault log: {}", args.input.display()))?;

    let run = pipeline::run(outcome, &config)?;
    let output = args.output_path();
    write_report(&run, args.format, &output)?;

    print_skip_summary(&run.skip_summary());
    eprintln!(
        "Report written to {} ({} machine sheets, {} records used)",
        output.display(),
        run.model.machine_sheets().count(),
        run.records_used
    );

    Ok(())
}
