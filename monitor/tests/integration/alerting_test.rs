//! Integration Test: アラート配送
//!
//! 連続失敗でWebhookへ1件だけ送信され、回復後は送信されないことを検証する。

use ollama_monitor::alert::AlertManager;
use ollama_monitor::config::AlertingConfig;
use ollama_monitor::types::{AlertSeverity, CheckResult};
use reqwest::Client;
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::RecordingSink;

fn alerting(webhook_url: String) -> AlertingConfig {
    AlertingConfig {
        enabled: true,
        webhook_url: Some(webhook_url),
        ..AlertingConfig::default()
    }
}

fn failed(endpoint: &str) -> CheckResult {
    CheckResult::error(endpoint, "Connection failed: connection refused").with_attempts(3)
}

#[tokio::test]
async fn test_three_failures_then_success_sends_one_webhook() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let mut manager = AlertManager::from_config(
        alerting(format!("{}/hook", webhook.uri())),
        Client::new(),
    );

    assert!(manager.process(&failed("/")).await.is_none());
    assert!(manager.process(&failed("/")).await.is_none());
    let alert = manager.process(&failed("/")).await;
    assert_eq!(alert.map(|a| a.severity), Some(AlertSeverity::Error));
    assert!(manager
        .process(&CheckResult::success("/", 200, 0.02))
        .await
        .is_none());

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let payload: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["service"], "ollama-monitor");
    assert_eq!(payload["severity"], "error");
    assert_eq!(payload["endpoint"], "/");
    assert_eq!(
        payload["message"],
        "Endpoint '/' has failed 3 times consecutively"
    );
    assert_eq!(payload["details"]["consecutive_failures"], 3);
    assert_eq!(payload["details"]["total_checks"], 3);
    assert!(payload["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_rejected_webhook_is_swallowed() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&webhook)
        .await;

    let mut manager = AlertManager::from_config(
        AlertingConfig {
            min_failures: 1,
            ..alerting(webhook.uri())
        },
        Client::new(),
    );

    // 配送失敗でもアラートは生成され、状態更新は続く
    assert!(manager.process(&failed("/")).await.is_some());
    assert!(manager.process(&failed("/")).await.is_some());
    assert_eq!(manager.stats()["/"].total_failures, 2);
    assert_eq!(webhook.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_custom_sink_receives_alerts() {
    let sink = RecordingSink::new();
    let mut manager = AlertManager::new(AlertingConfig {
        enabled: true,
        min_failures: 2,
        ..AlertingConfig::default()
    })
    .with_sink(sink.clone());

    manager.process(&failed("/api/tags")).await;
    manager.process(&failed("/api/tags")).await;

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].endpoint, "/api/tags");
    assert_eq!(
        alerts[0].details.last_error.as_deref(),
        Some("Connection failed: connection refused")
    );
}
