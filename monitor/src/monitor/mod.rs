//! 継続監視
//!
//! 一定間隔で全エンドポイントをチェックし、結果をメトリクスとアラートへ流す。
//! 状態は`Running → Stopping → Stopped`の順に遷移し、サイクルは重ならない。
//! 待機間隔は前サイクルの終了から数える。

pub mod session;

pub use session::MonitorSession;

use crate::alert::{AlertManager, EndpointAlertStats};
use crate::metrics::{record_result, MetricsSink, NoopMetrics};
use crate::types::CheckResults;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::info;

/// デフォルトのチェック間隔（秒）
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// ループの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// 実行中（待機中を含む）
    Running,
    /// 停止要求を受けて終了処理中
    Stopping,
    /// 停止済み
    Stopped,
}

/// 公開される監視ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    /// 状態
    pub state: LoopState,
    /// 完了したサイクル数
    pub cycles: u64,
}

/// ループ終了時の集計
#[derive(Debug, Clone)]
pub struct MonitorSummary {
    /// 完了したサイクル数
    pub cycles: u64,
    /// 最後のサイクルの結果
    pub last_results: CheckResults,
    /// エンドポイントごとの累積集計
    pub alert_stats: BTreeMap<String, EndpointAlertStats>,
}

/// 継続監視ループ
pub struct ContinuousMonitor {
    session: MonitorSession,
    interval: Duration,
    alerts: AlertManager,
    metrics: Arc<dyn MetricsSink>,
    status: watch::Sender<MonitorStatus>,
}

impl ContinuousMonitor {
    /// 設定のアラート設定とメトリクス無しで作成
    pub fn new(session: MonitorSession, interval: Duration) -> Self {
        let alerts = AlertManager::from_config(
            session.config().alerting_or_default(),
            session.client().clone(),
        );
        let (status, _) = watch::channel(MonitorStatus {
            state: LoopState::Running,
            cycles: 0,
        });
        Self {
            session,
            interval,
            alerts,
            metrics: Arc::new(NoopMetrics),
            status,
        }
    }

    /// アラートマネージャーを差し替え
    pub fn with_alert_manager(mut self, alerts: AlertManager) -> Self {
        self.alerts = alerts;
        self
    }

    /// メトリクスシンクを設定
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// ステータスの購読
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.subscribe()
    }

    fn publish(&self, state: LoopState, cycles: u64) {
        self.status.send_replace(MonitorStatus { state, cycles });
    }

    /// 停止要求まで監視を続ける
    pub async fn run(mut self) -> MonitorSummary {
        let shutdown = self.session.shutdown().clone();
        let mut cycles = 0u64;
        let mut last_results = CheckResults::new();

        info!(
            interval_secs = self.interval.as_secs_f64(),
            endpoints = self.session.config().endpoints.len(),
            "Starting continuous monitoring"
        );
        self.publish(LoopState::Running, cycles);

        loop {
            if shutdown.is_shutdown_requested() {
                break;
            }

            let results = self.session.run_checks().await;
            for result in results.values() {
                record_result(self.metrics.as_ref(), result);
            }
            for result in results.values() {
                self.alerts.process(result).await;
            }

            cycles += 1;
            last_results = results;
            self.publish(LoopState::Running, cycles);

            if shutdown.sleep_or_shutdown(self.interval).await {
                break;
            }
        }

        self.publish(LoopState::Stopping, cycles);
        info!(cycles = cycles, "Shutdown requested, stopping monitor");

        let summary = MonitorSummary {
            cycles,
            last_results,
            alert_stats: self.alerts.stats(),
        };
        self.publish(LoopState::Stopped, cycles);
        info!(cycles = cycles, "Monitoring stopped");
        summary
    }

    /// バックグラウンドタスクとして起動
    pub fn start(self) -> MonitorHandle {
        let status = self.subscribe();
        let shutdown = self.session.shutdown().clone();
        let task = tokio::spawn(self.run());
        MonitorHandle {
            status,
            shutdown,
            task,
        }
    }
}

/// 起動済みループのハンドル
#[derive(Debug)]
pub struct MonitorHandle {
    status: watch::Receiver<MonitorStatus>,
    shutdown: crate::shutdown::ShutdownController,
    task: JoinHandle<MonitorSummary>,
}

impl MonitorHandle {
    /// 現在のステータス
    pub fn status(&self) -> MonitorStatus {
        *self.status.borrow()
    }

    /// ステータス変更の購読
    pub fn watch(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// 停止要求を出す（実行中のサイクルは最後まで走る）
    pub fn stop(&self) {
        self.shutdown.request_shutdown();
    }

    /// ループの終了を待つ
    pub async fn join(self) -> Result<MonitorSummary, JoinError> {
        self.task.await
    }
}
