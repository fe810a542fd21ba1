//! 統合テスト用ヘルパー

#![allow(dead_code)]

use async_trait::async_trait;
use ollama_monitor::alert::AlertSink;
use ollama_monitor::config::MonitorConfig;
use ollama_monitor::error::AlertDeliveryError;
use ollama_monitor::health::{EndpointChecker, RetryPolicy};
use ollama_monitor::monitor::MonitorSession;
use ollama_monitor::types::{Alert, EndpointConfig};
use reqwest::Client;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// テスト用のリクエストタイムアウト
pub const TEST_TIMEOUT: Duration = Duration::from_millis(500);

/// 短い待機時間のリトライポリシー
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(10))
}

/// テスト用チェッカー（タイムアウト500ms、3回試行）
pub fn checker(base_url: &str) -> EndpointChecker {
    EndpointChecker::new(Client::new(), base_url)
        .with_timeout(TEST_TIMEOUT)
        .with_retry_policy(fast_retry(3))
}

/// 接続を受け付けないローカルアドレス
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Ollamaの最低限のエンドポイントを持つモックサーバー
///
/// - GET / → "Ollama is running"
/// - GET /api/tags → モデル一覧
pub async fn spawn_mock_ollama() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "llama3:8b", "size": 4_000_000_000i64 }
            ]
        })))
        .mount(&server)
        .await;

    server
}

/// エンドポイントを指定して設定を作成
pub fn config_for(base_url: &str, endpoints: &[(&str, EndpointConfig)]) -> MonitorConfig {
    let endpoints: BTreeMap<String, EndpointConfig> = endpoints
        .iter()
        .map(|(key, endpoint)| (key.to_string(), endpoint.clone()))
        .collect();
    MonitorConfig {
        base_url: base_url.to_string(),
        endpoints,
        ..MonitorConfig::default()
    }
}

/// テスト向けの短いタイムアウト・リトライ設定のセッション
pub fn session_for(config: MonitorConfig) -> MonitorSession {
    MonitorSession::new(config)
        .unwrap()
        .with_retry_policy(fast_retry(1))
        .with_request_timeout(TEST_TIMEOUT)
}

/// 受け取ったアラートを記録するシンク
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertDeliveryError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
