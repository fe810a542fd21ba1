//! エンドポイントチェッカー
//!
//! 1つのエンドポイントに対してリトライ付きのHTTPチェックを行い、`CheckResult`を返す。
//!
//! - 接続失敗・タイムアウト・DNS失敗などトランスポート障害のみリトライする
//! - レスポンスを受信できた場合は、ステータスや内容が期待と違っても即座に`failure`
//! - リトライを使い切ったトランスポート障害は`error`

use crate::error::CheckError;
use crate::health::retry::RetryPolicy;
use crate::types::{CheckResult, EndpointConfig};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// デフォルトのリクエストタイムアウト（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// ログに出力するレスポンスボディの最大文字数
const LOGGED_BODY_CHARS: usize = 500;

/// 1回の試行で受信したレスポンス
#[derive(Debug)]
struct ObservedResponse {
    status: u16,
    body: String,
    elapsed: Duration,
}

/// エンドポイントチェッカー
///
/// HTTPクライアントは共有ハンドルで、チェックごとに変更されることはない。
#[derive(Clone, Debug)]
pub struct EndpointChecker {
    /// HTTPクライアント
    client: Client,
    /// ベースURL
    base_url: String,
    /// リクエストごとのタイムアウト
    timeout: Duration,
    /// リトライポリシー
    retry: RetryPolicy,
}

impl EndpointChecker {
    /// 新しいチェッカーを作成
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// リトライポリシーを設定
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// ベースURL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// リクエストタイムアウト
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// リトライポリシー
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// 単一エンドポイントのチェック
    ///
    /// 失敗はすべて`CheckResult`に変換され、呼び出し元へ伝播しない。
    pub async fn check(&self, key: &str, endpoint: &EndpointConfig) -> CheckResult {
        let url = endpoint.url(&self.base_url);
        let attempts = self.retry.attempts();
        let mut last_error: Option<CheckError> = None;

        for attempt in 0..attempts {
            debug!(
                endpoint = %key,
                url = %url,
                method = %endpoint.method,
                attempt = attempt + 1,
                "Checking endpoint"
            );

            match self.send_once(&url, endpoint).await {
                Ok(observed) => {
                    return self.evaluate(key, endpoint, observed).with_attempts(attempt + 1);
                }
                Err(err) if err.is_retryable() => {
                    if attempt + 1 < attempts {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            endpoint = %key,
                            attempt = attempt + 1,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "Attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
                Err(err) => {
                    error!(endpoint = %key, error = %err, "Request could not be built");
                    return CheckResult::error(key, err.to_string()).with_attempts(attempt + 1);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        error!(
            endpoint = %key,
            attempts = attempts,
            error = %message,
            "Endpoint check failed after retries"
        );
        CheckResult::error(key, message).with_attempts(attempts)
    }

    /// 1回分のHTTPリクエストを送信し、ボディまで読み取る
    async fn send_once(
        &self,
        url: &str,
        endpoint: &EndpointConfig,
    ) -> Result<ObservedResponse, CheckError> {
        let mut request = self
            .client
            .request(endpoint.method.to_reqwest(), url)
            .timeout(self.timeout);
        for (name, value) in &endpoint.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &endpoint.body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(CheckError::from)?;

        Ok(ObservedResponse {
            status,
            body,
            elapsed: start.elapsed(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> CheckError {
        if err.is_builder() {
            CheckError::Request(err.to_string())
        } else if err.is_timeout() {
            CheckError::Transport(format!(
                "Request timed out after {:.1}s: {}",
                self.timeout.as_secs_f64(),
                err
            ))
        } else if err.is_connect() {
            CheckError::Transport(format!("Connection failed: {}", err))
        } else {
            CheckError::Transport(err.to_string())
        }
    }

    fn evaluate(&self, key: &str, endpoint: &EndpointConfig, observed: ObservedResponse) -> CheckResult {
        let response_time = observed.elapsed.as_secs_f64();
        let preview: String = observed.body.chars().take(LOGGED_BODY_CHARS).collect();

        debug!(
            endpoint = %key,
            status_code = observed.status,
            response_time = response_time,
            body = %preview,
            "Received response"
        );

        match evaluate_response(endpoint, observed.status, &observed.body) {
            Ok(()) => {
                info!(
                    endpoint = %key,
                    status_code = observed.status,
                    response_time = response_time,
                    "Endpoint is functioning correctly"
                );
                CheckResult::success(key, observed.status, response_time)
            }
            Err(err) => {
                warn!(
                    endpoint = %key,
                    status_code = observed.status,
                    response_time = response_time,
                    error = %err,
                    "Endpoint check did not meet expectations"
                );
                CheckResult::failure(key, observed.status, response_time, err.to_string())
            }
        }
    }
}

/// 受信したレスポンスが期待を満たすか判定
///
/// ステータスが一致し、かつ期待コンテンツが未指定またはボディに含まれる場合のみ成功。
pub fn evaluate_response(
    endpoint: &EndpointConfig,
    status: u16,
    body: &str,
) -> Result<(), CheckError> {
    if status != endpoint.expected_status {
        return Err(CheckError::Mismatch(format!(
            "Unexpected status code: {} (expected {})",
            status, endpoint.expected_status
        )));
    }
    if let Some(expected) = endpoint.expected_content.as_deref() {
        if !body.contains(expected) {
            return Err(CheckError::Mismatch(format!(
                "Expected content not found: {}",
                expected
            )));
        }
    }
    Ok(())
}
