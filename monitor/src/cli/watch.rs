//! watch subcommand
//!
//! Runs the continuous monitoring loop until Ctrl-C or SIGTERM.

use super::GlobalArgs;
use crate::metrics::MetricsSink;
use crate::monitor::{ContinuousMonitor, MonitorSession, DEFAULT_INTERVAL_SECS};
use crate::shutdown::{listen_for_signals, ShutdownController};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Arguments for the watch subcommand
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Seconds to wait between check cycles
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

/// Execute the watch command
pub async fn execute(global: &GlobalArgs, args: &WatchArgs) -> Result<(), anyhow::Error> {
    let config = global.load_config()?;
    let shutdown = ShutdownController::new();
    let signals = listen_for_signals(shutdown.clone());
    let metrics = global.start_metrics(&shutdown)?;

    let session = MonitorSession::new(config)?.with_shutdown(shutdown.clone());
    let mut monitor = ContinuousMonitor::new(session, Duration::from_secs(args.interval));
    if let Some(metrics) = metrics {
        monitor = monitor.with_metrics(Arc::new(metrics) as Arc<dyn MetricsSink>);
    }

    let summary = monitor.start().join().await?;
    signals.abort();

    info!(cycles = summary.cycles, "Continuous monitoring finished");
    for (endpoint, stats) in &summary.alert_stats {
        println!(
            "  {:<24} checks={} failures={} success_rate={:.1}%",
            endpoint,
            stats.total_checks,
            stats.total_failures,
            stats.success_rate * 100.0
        );
    }
    Ok(())
}
