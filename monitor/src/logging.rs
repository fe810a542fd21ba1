//! ロギング初期化
//!
//! フィルタは`RUST_LOG`を優先し、未設定なら指定レベル（`--log-level` /
//! `OLLAMA_MONITOR_LOG_LEVEL`）、それも無ければ`info`。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// デフォルトのログレベル
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 人間向けテキスト
    #[default]
    Text,
    /// 1行1JSON
    Json,
}

/// ロギング設定
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// ログレベルまたはフィルタディレクティブ
    pub level: Option<String>,
    /// 標準エラー出力の形式
    pub format: LogFormat,
    /// 追加の出力先ファイル（JSON形式で書き込む）
    pub file: Option<PathBuf>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// フィルタディレクティブを決定
pub fn filter_directive(rust_log: Option<&str>, level: Option<&str>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .or(level.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// グローバルsubscriberを初期化
///
/// ファイル出力を有効にした場合、返された`WorkerGuard`をプロセス終了まで保持すること。
pub fn init(options: &LogOptions) -> anyhow::Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(rust_log.as_deref(), options.level.as_deref());
    let env_filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{directive}'"))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(match options.format {
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    });

    let mut guard = None;
    if let Some(path) = &options.file {
        let file_name = path
            .file_name()
            .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(guard)
}
