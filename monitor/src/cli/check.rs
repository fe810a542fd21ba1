//! check subcommand
//!
//! Runs every configured endpoint check once and writes a report.

use super::GlobalArgs;
use crate::metrics::record_result;
use crate::monitor::MonitorSession;
use crate::report::{write_report, Report, ReportFormat};
use crate::shutdown::ShutdownController;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the check subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Report output path (default: ollama_monitor_report.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the check command
pub async fn execute(global: &GlobalArgs, args: &CheckArgs) -> Result<(), anyhow::Error> {
    let config = global.load_config()?;
    let endpoints = config.endpoints.clone();
    let shutdown = ShutdownController::new();
    let metrics = global.start_metrics(&shutdown)?;

    let session = MonitorSession::new(config)?.with_shutdown(shutdown.clone());
    let results = session.run_checks().await;

    if let Some(metrics) = &metrics {
        for result in results.values() {
            record_result(metrics, result);
        }
    }

    let report = Report::from_results(&results, &endpoints);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(args.format.default_filename()));
    write_report(&output, args.format, &report).await?;

    println!(
        "Checked {} endpoint(s): {} successful, {} failed",
        report.summary.total_endpoints, report.summary.successful, report.summary.failed
    );
    for row in &report.endpoints {
        match (&row.error, row.response_time_seconds) {
            (None, Some(rt)) => println!("  {:<24} {:<8} {:.3}s", row.name, row.status.as_str(), rt),
            (Some(err), _) => println!("  {:<24} {:<8} {}", row.name, row.status.as_str(), err),
            (None, None) => println!("  {:<24} {}", row.name, row.status.as_str()),
        }
    }
    println!("Report written to {}", output.display());

    shutdown.request_shutdown();
    Ok(())
}
