//! メトリクス
//!
//! チェック結果をメトリクスシンクへ記録する。Prometheus実装は
//! `ollama_endpoint_up` / `ollama_request_duration_seconds` /
//! `ollama_request_errors_total`（いずれも`endpoint`ラベル付き）を公開する。

pub mod server;

use crate::types::CheckResult;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// メトリクス記録先
pub trait MetricsSink: Send + Sync {
    /// エンドポイントの稼働状態
    fn set_endpoint_up(&self, endpoint: &str, up: bool);
    /// 応答時間（秒）
    fn observe_duration(&self, endpoint: &str, seconds: f64);
    /// エラー回数を加算
    fn increment_errors(&self, endpoint: &str);
}

/// 何も記録しないシンク
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn set_endpoint_up(&self, _endpoint: &str, _up: bool) {}
    fn observe_duration(&self, _endpoint: &str, _seconds: f64) {}
    fn increment_errors(&self, _endpoint: &str) {}
}

/// Prometheusメトリクス
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    endpoint_up: GaugeVec,
    request_duration: HistogramVec,
    request_errors: IntCounterVec,
}

impl PrometheusMetrics {
    /// 専用レジストリを作成して計測器を登録
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let endpoint_up = GaugeVec::new(
            Opts::new("ollama_endpoint_up", "Whether the Ollama endpoint is up (1) or down (0)"),
            &["endpoint"],
        )?;
        registry.register(Box::new(endpoint_up.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "ollama_request_duration_seconds",
                "Request duration in seconds",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let request_errors = IntCounterVec::new(
            Opts::new("ollama_request_errors_total", "Total number of request errors"),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_errors.clone()))?;

        Ok(Self {
            registry,
            endpoint_up,
            request_duration,
            request_errors,
        })
    }

    /// レジストリ
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// テキスト形式でエンコード
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn set_endpoint_up(&self, endpoint: &str, up: bool) {
        self.endpoint_up
            .with_label_values(&[endpoint])
            .set(if up { 1.0 } else { 0.0 });
    }

    fn observe_duration(&self, endpoint: &str, seconds: f64) {
        self.request_duration
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    fn increment_errors(&self, endpoint: &str) {
        self.request_errors.with_label_values(&[endpoint]).inc();
    }
}

/// チェック結果1件をシンクへ記録
pub fn record_result(sink: &dyn MetricsSink, result: &CheckResult) {
    let endpoint = result.endpoint.as_str();
    sink.set_endpoint_up(endpoint, result.is_success());
    if let Some(seconds) = result.response_time {
        sink.observe_duration(endpoint, seconds);
    }
    if !result.is_success() {
        sink.increment_errors(endpoint);
    }
}
