//! 監視セッション
//!
//! 検証済み設定・共有HTTPクライアント・リトライポリシー・停止シグナルを束ねる。
//! チェック、負荷テスト、継続監視はすべてセッション経由で実行する。

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::health::{CheckRunner, EndpointChecker, RetryPolicy};
use crate::load_test::LoadTester;
use crate::shutdown::ShutdownController;
use crate::types::{CheckResults, EndpointConfig, LoadTestResult};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 監視セッション
#[derive(Clone, Debug)]
pub struct MonitorSession {
    config: Arc<MonitorConfig>,
    endpoints: Arc<BTreeMap<String, EndpointConfig>>,
    client: Client,
    retry: RetryPolicy,
    timeout: Duration,
    shutdown: ShutdownController,
}

impl MonitorSession {
    /// 設定を検証してセッションを作成
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;

        // HTTPクライアント（接続プーリング有効）
        let client = Client::builder()
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| MonitorError::HttpClient(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            endpoints = config.endpoints.len(),
            timeout_secs = config.timeout_secs,
            retry_attempts = config.retry_attempts,
            "Monitor session created"
        );

        Ok(Self {
            retry: config.retry_policy(),
            timeout: config.request_timeout(),
            endpoints: Arc::new(config.endpoints.clone()),
            config: Arc::new(config),
            client,
            shutdown: ShutdownController::new(),
        })
    }

    /// 外部の停止シグナルを注入
    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// リトライポリシーを上書き
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// リクエストタイムアウトを上書き
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 設定
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// 共有HTTPクライアント
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// 停止シグナル
    pub fn shutdown(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// セッション設定を反映したチェッカー
    pub fn checker(&self) -> EndpointChecker {
        EndpointChecker::new(self.client.clone(), self.config.base_url.clone())
            .with_timeout(self.timeout)
            .with_retry_policy(self.retry)
    }

    /// 全エンドポイント用のランナー
    pub fn runner(&self) -> CheckRunner {
        CheckRunner::new(self.checker(), self.endpoints.clone())
    }

    /// 全エンドポイントを1回チェック
    pub async fn run_checks(&self) -> CheckResults {
        self.runner().run().await
    }

    /// 設定済みエンドポイントに負荷テストを実行
    pub async fn load_test(
        &self,
        key: &str,
        total_requests: usize,
        concurrency: usize,
    ) -> MonitorResult<LoadTestResult> {
        let endpoint = self
            .endpoints
            .get(key)
            .ok_or_else(|| MonitorError::UnknownEndpoint(key.to_string()))?;

        LoadTester::new(self.checker())
            .with_shutdown(self.shutdown.clone())
            .run(key, endpoint, total_requests, concurrency)
            .await
    }
}
