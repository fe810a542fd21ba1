//! CLI module for ollama-monitor
//!
//! Provides the command-line interface for one-shot checks, load tests and
//! continuous monitoring.

pub mod check;
pub mod watch;

use crate::config::MonitorConfig;
use crate::logging::{LogFormat, LogOptions};
use crate::metrics::server::{self, DEFAULT_METRICS_PORT};
use crate::metrics::PrometheusMetrics;
use crate::shutdown::ShutdownController;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Ollama monitor - Health checks, load tests and continuous monitoring for an Ollama server
#[derive(Parser, Debug)]
#[command(name = "ollama-monitor")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    OLLAMA_MONITOR_BASE_URL        Base URL (default: http://127.0.0.1:11434, legacy: OLLAMA_API_BASE)
    OLLAMA_MONITOR_TIMEOUT         Request timeout in seconds (default: 10, legacy: DEFAULT_TIMEOUT)
    OLLAMA_MONITOR_RETRY_ATTEMPTS  Attempts per check (default: 3, legacy: RETRY_ATTEMPTS)
    OLLAMA_MONITOR_RETRY_DELAY_MS  Base retry delay in milliseconds (default: 2000, legacy: RETRY_DELAY in seconds)
    OLLAMA_MONITOR_CONFIG          Path to YAML configuration file
    OLLAMA_MONITOR_LOG_LEVEL       Log level (default: info, RUST_LOG takes precedence)
"#)]
pub struct Cli {
    /// Options shared by all subcommands
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute (default: check)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the Ollama server
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Path to YAML configuration file
    #[arg(long, global = true, env = "OLLAMA_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Export Prometheus metrics
    #[arg(long, global = true)]
    pub prometheus: bool,

    /// Port for the Prometheus metrics endpoint
    #[arg(long, global = true, default_value_t = DEFAULT_METRICS_PORT)]
    pub prometheus_port: u16,

    /// Log level or filter directive
    #[arg(long, global = true, env = "OLLAMA_MONITOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every configured endpoint once and write a report
    Check(check::CheckArgs),
    /// Send concurrent requests to one endpoint and report latency statistics
    LoadTest(load_test::LoadTestArgs),
    /// Check endpoints periodically until interrupted
    Watch(watch::WatchArgs),
}

impl GlobalArgs {
    /// ロギング設定
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.log_level.clone(),
            format: self.log_format,
            file: self.log_file.clone(),
        }
    }

    /// 設定を解決する（CLI > 設定ファイル > 環境変数）
    pub fn load_config(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = MonitorConfig::from_env();
        if let Some(path) = &self.config {
            info!(path = %path.display(), "Loading configuration file");
            config = config.overlay_yaml_file(path)?;
        }

        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    /// `--prometheus`指定時にメトリクスサーバーを起動
    pub fn start_metrics(
        &self,
        shutdown: &ShutdownController,
    ) -> anyhow::Result<Option<PrometheusMetrics>> {
        if !self.prometheus {
            return Ok(None);
        }

        let metrics = PrometheusMetrics::new().context("Failed to register metrics")?;
        let addr = SocketAddr::from(([0, 0, 0, 0], self.prometheus_port));
        let serving = metrics.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(serving, addr, shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        });
        Ok(Some(metrics))
    }
}
