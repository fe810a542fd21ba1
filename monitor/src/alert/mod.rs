//! アラート管理
//!
//! エンドポイントごとに連続失敗回数と累積成功率を追跡し、閾値を超えたら
//! `AlertSink`へアラートを配送する。
//!
//! - 連続失敗回数が`min_failures`以上 → `error`
//! - 累積チェック数が`min_samples`以上、かつ累積成功率が`alert_threshold`未満 → `warning`
//!
//! 両方の条件を満たす場合は連続失敗のアラートを1件だけ出す。
//! 状態はアラートの有効・無効に関係なく常に更新する。

pub mod webhook;

pub use webhook::{AlertSink, WebhookSink};

use crate::config::AlertingConfig;
use crate::types::{Alert, AlertDetails, AlertSeverity, CheckResult};
use reqwest::Client;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone)]
struct AlertState {
    consecutive_failures: u64,
    total_checks: u64,
    total_failures: u64,
    last_error: Option<String>,
    firing: bool,
}

impl AlertState {
    fn record(&mut self, result: &CheckResult) {
        self.total_checks += 1;
        if result.is_success() {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
            self.total_failures += 1;
            self.last_error = result.error_message.clone();
        }
    }

    fn success_rate(&self) -> f64 {
        if self.total_checks == 0 {
            1.0
        } else {
            (self.total_checks - self.total_failures) as f64 / self.total_checks as f64
        }
    }

    fn details(&self) -> AlertDetails {
        AlertDetails {
            consecutive_failures: self.consecutive_failures,
            total_checks: self.total_checks,
            total_failures: self.total_failures,
            success_rate: self.success_rate(),
            last_error: self.last_error.clone(),
        }
    }
}

/// エンドポイント単位の集計スナップショット
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EndpointAlertStats {
    /// 累積チェック回数
    pub total_checks: u64,
    /// 累積失敗回数
    pub total_failures: u64,
    /// 累積成功回数
    pub successful_checks: u64,
    /// 累積成功率（0.0-1.0）
    pub success_rate: f64,
    /// 現在の連続失敗回数
    pub consecutive_failures: u64,
}

/// アラートマネージャー
pub struct AlertManager {
    config: AlertingConfig,
    sink: Option<Arc<dyn AlertSink>>,
    states: HashMap<String, AlertState>,
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .field("endpoints", &self.states.len())
            .finish()
    }
}

impl AlertManager {
    /// 配送先なしで作成（アラートは生成されるが送信されない）
    pub fn new(config: AlertingConfig) -> Self {
        Self {
            config,
            sink: None,
            states: HashMap::new(),
        }
    }

    /// 設定からWebhook配送先付きで作成
    pub fn from_config(config: AlertingConfig, client: Client) -> Self {
        let sink = config
            .webhook_url
            .clone()
            .filter(|_| config.enabled)
            .map(|url| Arc::new(WebhookSink::new(client, url)) as Arc<dyn AlertSink>);
        Self {
            config,
            sink,
            states: HashMap::new(),
        }
    }

    /// 配送先を差し替える
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// アラート生成が有効かどうか
    pub fn is_active(&self) -> bool {
        self.config.enabled && self.config.alert_on_failure
    }

    /// チェック結果を反映し、発火条件を満たせばアラートを返す
    pub fn observe(&mut self, result: &CheckResult) -> Option<Alert> {
        let active = self.is_active();
        let config = &self.config;
        let state = self.states.entry(result.endpoint.clone()).or_default();
        state.record(result);

        let consecutive = state.consecutive_failures >= config.min_failures;
        let low_rate = state.total_checks >= config.min_samples
            && state.success_rate() < config.alert_threshold;

        if !consecutive && !low_rate {
            state.firing = false;
            return None;
        }
        if !active {
            return None;
        }
        if config.suppress_repeats && state.firing {
            return None;
        }
        state.firing = true;

        let endpoint = &result.endpoint;
        let alert = if consecutive {
            Alert::new(
                AlertSeverity::Error,
                endpoint,
                format!(
                    "Endpoint '{}' has failed {} times consecutively",
                    endpoint, state.consecutive_failures
                ),
                state.details(),
            )
        } else {
            Alert::new(
                AlertSeverity::Warning,
                endpoint,
                format!(
                    "Endpoint '{}' success rate ({:.1}%) is below threshold ({:.1}%)",
                    endpoint,
                    state.success_rate() * 100.0,
                    config.alert_threshold * 100.0
                ),
                state.details(),
            )
        };
        Some(alert)
    }

    /// チェック結果を反映し、必要ならアラートを配送する
    ///
    /// 配送の失敗はログに残すだけで呼び出し元には返さない。
    pub async fn process(&mut self, result: &CheckResult) -> Option<Alert> {
        let alert = self.observe(result)?;
        warn!(
            endpoint = %alert.endpoint,
            severity = %alert.severity,
            message = %alert.message,
            "Alert triggered"
        );

        match &self.sink {
            Some(sink) => match sink.send(&alert).await {
                Ok(()) => info!(endpoint = %alert.endpoint, "Alert sent"),
                Err(e) => error!(endpoint = %alert.endpoint, error = %e, "Failed to send alert"),
            },
            None => warn!(endpoint = %alert.endpoint, "No alert sink configured, alert not delivered"),
        }
        Some(alert)
    }

    /// エンドポイントごとの集計
    pub fn stats(&self) -> BTreeMap<String, EndpointAlertStats> {
        self.states
            .iter()
            .map(|(endpoint, state)| {
                (
                    endpoint.clone(),
                    EndpointAlertStats {
                        total_checks: state.total_checks,
                        total_failures: state.total_failures,
                        successful_checks: state.total_checks - state.total_failures,
                        success_rate: state.success_rate(),
                        consecutive_failures: state.consecutive_failures,
                    },
                )
            })
            .collect()
    }

    /// 全状態をクリア
    pub fn reset(&mut self) {
        self.states.clear();
    }
}
