//! 負荷テスト
//!
//! 1つのエンドポイントに`total_requests`件のリクエストを、同時実行数
//! `concurrency`以下で送信し、成功・失敗数とレイテンシ統計を集計する。
//!
//! 各リクエストは`EndpointChecker`を通すため、リトライポリシーもそのまま適用される。

pub mod stats;

use crate::error::{MonitorError, MonitorResult};
use crate::health::EndpointChecker;
use crate::shutdown::ShutdownController;
use crate::types::{EndpointConfig, LoadTestResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 負荷テスター
#[derive(Clone, Debug)]
pub struct LoadTester {
    checker: EndpointChecker,
    shutdown: Option<ShutdownController>,
}

impl LoadTester {
    /// 新しい負荷テスターを作成
    pub fn new(checker: EndpointChecker) -> Self {
        Self {
            checker,
            shutdown: None,
        }
    }

    /// 停止要求を監視する（要求後は新規リクエストを発行しない）
    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(ShutdownController::is_shutdown_requested)
    }

    /// 負荷テストを実行
    ///
    /// `total_requests`と`concurrency`は1以上であること。
    pub async fn run(
        &self,
        key: &str,
        endpoint: &EndpointConfig,
        total_requests: usize,
        concurrency: usize,
    ) -> MonitorResult<LoadTestResult> {
        if total_requests == 0 {
            return Err(MonitorError::InvalidArgument(
                "total_requests must be at least 1".to_string(),
            ));
        }
        if concurrency == 0 {
            return Err(MonitorError::InvalidArgument(
                "concurrency must be at least 1".to_string(),
            ));
        }

        info!(
            endpoint = %key,
            total_requests = total_requests,
            concurrency = concurrency,
            "Starting load test"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let started = Instant::now();
        let mut handles = Vec::with_capacity(total_requests);

        for _ in 0..total_requests {
            if self.shutdown_requested() {
                break;
            }
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(endpoint = %key, error = %e, "Load test semaphore closed");
                    break;
                }
            };
            if self.shutdown_requested() {
                break;
            }

            let checker = self.checker.clone();
            let endpoint = endpoint.clone();
            let key = key.to_string();
            handles.push(tokio::spawn(async move {
                let result = checker.check(&key, &endpoint).await;
                drop(permit);
                result
            }));
        }

        let dispatched = handles.len();
        if dispatched < total_requests {
            warn!(
                endpoint = %key,
                dispatched = dispatched,
                total_requests = total_requests,
                "Load test interrupted by shutdown"
            );
        }

        let mut successful_requests = 0;
        let mut failed_requests = 0;
        let mut response_times = Vec::with_capacity(dispatched);

        for handle in handles {
            match handle.await {
                Ok(result) if result.is_success() => {
                    successful_requests += 1;
                    if let Some(rt) = result.response_time {
                        response_times.push(rt);
                    }
                }
                Ok(_) => failed_requests += 1,
                Err(e) => {
                    error!(endpoint = %key, error = %e, "Load test task join error");
                    failed_requests += 1;
                }
            }
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        let completed = successful_requests + failed_requests;
        let requests_per_second = if elapsed_seconds > 0.0 {
            completed as f64 / elapsed_seconds
        } else {
            0.0
        };
        let latency = stats::summarize(&response_times);

        match &latency {
            Some(latency) => info!(
                endpoint = %key,
                successful = successful_requests,
                failed = failed_requests,
                elapsed_seconds = elapsed_seconds,
                requests_per_second = requests_per_second,
                average = latency.average,
                median = latency.median,
                p95 = latency.p95,
                "Load test completed"
            ),
            None => warn!(
                endpoint = %key,
                successful = successful_requests,
                failed = failed_requests,
                elapsed_seconds = elapsed_seconds,
                "Load test completed without any successful request"
            ),
        }

        Ok(LoadTestResult {
            endpoint: key.to_string(),
            total_requests,
            concurrency,
            successful_requests,
            failed_requests,
            response_times,
            latency,
            elapsed_seconds,
            requests_per_second,
        })
    }
}
