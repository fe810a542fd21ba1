//! Integration Test: 負荷テスト

use ollama_monitor::load_test::LoadTester;
use ollama_monitor::shutdown::ShutdownController;
use ollama_monitor::types::EndpointConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{checker, config_for, fast_retry, session_for, spawn_mock_ollama};

#[tokio::test]
async fn test_load_test_against_healthy_server() {
    let server = spawn_mock_ollama().await;
    let session = session_for(config_for(&server.uri(), &[("/", EndpointConfig::new("/"))]));

    let result = session.load_test("/", 100, 10).await.unwrap();

    assert_eq!(result.total_requests, 100);
    assert_eq!(result.concurrency, 10);
    assert_eq!(result.successful_requests, 100);
    assert_eq!(result.failed_requests, 0);
    assert_eq!(result.response_times.len(), 100);

    let latency = result.latency.expect("latency stats should be present");
    assert!(latency.min <= latency.median);
    assert!(latency.median <= latency.p95);
    assert!(latency.p95 <= latency.max);
    assert!(result.requests_per_second > 0.0);

    assert_eq!(server.received_requests().await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_load_test_without_successes_has_no_latency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let session = session_for(config_for(&server.uri(), &[("/", EndpointConfig::new("/"))]));

    let result = session.load_test("/", 20, 5).await.unwrap();

    assert_eq!(result.successful_requests, 0);
    assert_eq!(result.failed_requests, 20);
    assert!(result.response_times.is_empty());
    assert!(result.latency.is_none());
}

/// 同時処理中のリクエスト数の最大値を記録するHTTPサーバー
///
/// 応答を書き込む前にカウンタを戻すので、クライアント側の同時実行数を超えて数えることはない。
async fn spawn_counting_server(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let observed = peak.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            tokio::spawn(async move {
                let mut request: Vec<u8> = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }

                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);

                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
            });
        }
    });

    (format!("http://{}", addr), observed)
}

#[tokio::test]
async fn test_concurrency_limits_in_flight_requests() {
    let (url, peak) = spawn_counting_server(Duration::from_millis(30)).await;

    let tester = LoadTester::new(
        checker(&url)
            .with_timeout(Duration::from_secs(5))
            .with_retry_policy(fast_retry(1)),
    );
    let result = tester
        .run("/", &EndpointConfig::new("/"), 60, 7)
        .await
        .unwrap();

    assert_eq!(result.successful_requests, 60);
    assert_eq!(result.failed_requests, 0);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 7, "peak in-flight requests {peak} exceeded concurrency 7");
    assert!(peak > 1, "requests were not dispatched concurrently");
}

#[tokio::test]
async fn test_shutdown_stops_dispatching_new_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let shutdown = ShutdownController::new();
    let tester = LoadTester::new(
        checker(&server.uri())
            .with_timeout(Duration::from_secs(5))
            .with_retry_policy(fast_retry(1)),
    )
    .with_shutdown(shutdown.clone());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.request_shutdown();
    });

    let result = tester
        .run("/", &EndpointConfig::new("/"), 100, 2)
        .await
        .unwrap();

    assert_eq!(result.total_requests, 100);
    assert!(result.completed_requests() < 100);
    // 発行済みのリクエストは最後まで実行される
    assert_eq!(result.completed_requests(), result.successful_requests);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        result.completed_requests()
    );
}
