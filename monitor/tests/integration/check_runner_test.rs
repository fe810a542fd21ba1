//! Integration Test: 全エンドポイントの並列チェック

use ollama_monitor::health::CheckRunner;
use ollama_monitor::types::{CheckOutcome, EndpointConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{checker, config_for, session_for, spawn_mock_ollama, TEST_TIMEOUT};

#[tokio::test]
async fn test_mixed_results_are_keyed_by_endpoint() {
    let server = spawn_mock_ollama().await;
    Mock::given(method("GET"))
        .and(path("/api/ps"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config_for(
        &server.uri(),
        &[
            ("/", EndpointConfig::new("/").with_expected_content("Ollama is running")),
            ("/api/tags", EndpointConfig::new("/api/tags").with_expected_content("llama3")),
            ("/api/ps", EndpointConfig::new("/api/ps")),
        ],
    );
    let results = session_for(config).run_checks().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results["/"].outcome, CheckOutcome::Success);
    assert_eq!(results["/api/tags"].outcome, CheckOutcome::Success);
    assert_eq!(results["/api/ps"].outcome, CheckOutcome::Failure);
    assert_eq!(results["/api/ps"].status_code, Some(503));
    assert_eq!(results["/api/ps"].endpoint, "/api/ps");
}

#[tokio::test]
async fn test_checks_run_concurrently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let mut endpoints = BTreeMap::new();
    for key in ["/a", "/b", "/c", "/d"] {
        endpoints.insert(key.to_string(), EndpointConfig::new(key));
    }
    let runner = CheckRunner::new(
        checker(&server.uri()).with_timeout(Duration::from_secs(5)),
        Arc::new(endpoints),
    );

    let started = Instant::now();
    let results = runner.run().await;

    assert_eq!(results.len(), 4);
    assert!(results.values().all(|r| r.is_success()));
    // 逐次実行なら1.2秒以上かかる
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_failing_endpoint_does_not_affect_others() {
    let server = spawn_mock_ollama().await;

    let config = config_for(
        &server.uri(),
        &[
            ("/", EndpointConfig::new("/")),
            // 存在しないパスはwiremockが404を返す
            ("/missing", EndpointConfig::new("/missing")),
        ],
    );
    let results = session_for(config).run_checks().await;

    assert!(results["/"].is_success());
    assert_eq!(results["/missing"].outcome, CheckOutcome::Failure);
    assert_eq!(results["/missing"].status_code, Some(404));
}

#[tokio::test]
async fn test_timed_out_endpoint_does_not_affect_others() {
    let server = spawn_mock_ollama().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(TEST_TIMEOUT * 4))
        .mount(&server)
        .await;

    let mut endpoints = BTreeMap::new();
    endpoints.insert("/".to_string(), EndpointConfig::new("/"));
    endpoints.insert("/api/slow".to_string(), EndpointConfig::new("/api/slow"));
    let runner = CheckRunner::new(checker(&server.uri()), Arc::new(endpoints));

    let results = runner.run().await;

    assert_eq!(results.len(), 2);
    assert!(results["/"].is_success());
    assert_eq!(results["/"].attempts, 1);

    let slow = &results["/api/slow"];
    assert_eq!(slow.outcome, CheckOutcome::Error);
    assert_eq!(slow.attempts, 3);
    assert!(slow.status_code.is_none());
    assert!(slow.error_message.is_some());
}
