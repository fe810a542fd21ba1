//! Integration Test: 継続監視ループ
//!
//! 停止要求でサイクル間の待機が中断され、`Stopped`へ遷移することを検証する。

use ollama_monitor::alert::AlertManager;
use ollama_monitor::config::AlertingConfig;
use ollama_monitor::metrics::{MetricsSink, PrometheusMetrics};
use ollama_monitor::monitor::{ContinuousMonitor, LoopState, MonitorStatus};
use ollama_monitor::shutdown::ShutdownController;
use ollama_monitor::types::EndpointConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{config_for, session_for, spawn_mock_ollama};

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

async fn wait_for_cycles(status: &mut watch::Receiver<MonitorStatus>, cycles: u64) {
    let reached = tokio::time::timeout(JOIN_TIMEOUT, status.wait_for(|s| s.cycles >= cycles))
        .await
        .expect("monitor did not reach the expected cycle count")
        .is_ok();
    assert!(reached, "status channel closed");
}

#[tokio::test]
async fn test_stop_during_wait_ends_after_one_cycle() {
    let server = spawn_mock_ollama().await;
    let shutdown = ShutdownController::new();
    let session = session_for(config_for(&server.uri(), &[("/", EndpointConfig::new("/"))]))
        .with_shutdown(shutdown.clone());

    let handle = ContinuousMonitor::new(session, Duration::from_secs(3600)).start();
    let mut status = handle.watch();
    wait_for_cycles(&mut status, 1).await;
    assert_eq!(handle.status().state, LoopState::Running);

    handle.stop();
    assert!(shutdown.is_shutdown_requested());

    let summary = tokio::time::timeout(JOIN_TIMEOUT, handle.join())
        .await
        .expect("monitor should stop without waiting for the interval")
        .unwrap();

    assert_eq!(summary.cycles, 1);
    assert!(summary.last_results["/"].is_success());
    assert_eq!(
        *status.borrow(),
        MonitorStatus {
            state: LoopState::Stopped,
            cycles: 1,
        }
    );
}

#[tokio::test]
async fn test_stop_during_cycle_finishes_that_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    let session = session_for(config_for(&server.uri(), &[("/", EndpointConfig::new("/"))]))
        .with_request_timeout(Duration::from_secs(5));

    let handle = ContinuousMonitor::new(session, Duration::from_secs(3600)).start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop();

    let summary = tokio::time::timeout(JOIN_TIMEOUT, handle.join())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.cycles, 1);
    assert!(summary.last_results["/"].is_success());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cycles_feed_metrics() {
    let server = spawn_mock_ollama().await;
    let metrics = PrometheusMetrics::new().unwrap();
    let session = session_for(config_for(
        &server.uri(),
        &[
            ("/", EndpointConfig::new("/")),
            ("/missing", EndpointConfig::new("/missing")),
        ],
    ));

    let handle = ContinuousMonitor::new(session, Duration::from_millis(20))
        .with_metrics(Arc::new(metrics.clone()) as Arc<dyn MetricsSink>)
        .start();
    let mut status = handle.watch();
    wait_for_cycles(&mut status, 2).await;
    handle.stop();
    tokio::time::timeout(JOIN_TIMEOUT, handle.join())
        .await
        .unwrap()
        .unwrap();

    let text = metrics.encode().unwrap();
    assert!(text.contains("ollama_endpoint_up{endpoint=\"/\"} 1"));
    assert!(text.contains("ollama_endpoint_up{endpoint=\"/missing\"} 0"));
    assert!(text.contains("ollama_request_errors_total{endpoint=\"/missing\"}"));
}

#[tokio::test]
async fn test_failing_webhook_does_not_stop_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&webhook)
        .await;

    let session = session_for(config_for(&server.uri(), &[("/", EndpointConfig::new("/"))]));
    let alerts = AlertManager::from_config(
        AlertingConfig {
            enabled: true,
            webhook_url: Some(webhook.uri()),
            min_failures: 1,
            ..AlertingConfig::default()
        },
        Client::new(),
    );

    let handle = ContinuousMonitor::new(session, Duration::from_millis(10))
        .with_alert_manager(alerts)
        .start();
    let mut status = handle.watch();
    wait_for_cycles(&mut status, 3).await;
    handle.stop();

    let summary = tokio::time::timeout(JOIN_TIMEOUT, handle.join())
        .await
        .unwrap()
        .unwrap();

    assert!(summary.cycles >= 3);
    let stats = &summary.alert_stats["/"];
    assert_eq!(stats.total_failures, summary.cycles);
    assert_eq!(stats.success_rate, 0.0);
    assert!(webhook.received_requests().await.unwrap().len() as u64 >= 3);
}
