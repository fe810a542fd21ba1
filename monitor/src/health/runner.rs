//! 全エンドポイントの並列チェック
//!
//! エンドポイントごとにタスクを起動し、全タスクの完了を待って結果を集約する。

use super::EndpointChecker;
use crate::types::{CheckResult, CheckResults, EndpointConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 並列チェックランナー
///
/// エンドポイント数は少ない前提のため、同時実行数の上限は設けない。
#[derive(Clone, Debug)]
pub struct CheckRunner {
    checker: EndpointChecker,
    endpoints: Arc<BTreeMap<String, EndpointConfig>>,
}

impl CheckRunner {
    /// 新しいランナーを作成
    pub fn new(checker: EndpointChecker, endpoints: Arc<BTreeMap<String, EndpointConfig>>) -> Self {
        Self { checker, endpoints }
    }

    /// 対象エンドポイント数
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// 対象エンドポイントが空かどうか
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// 全エンドポイントを並列チェック
    ///
    /// 1つのチェックが失敗（パニックを含む）しても他のチェックには影響しない。
    pub async fn run(&self) -> CheckResults {
        if self.endpoints.is_empty() {
            info!("No endpoints to check");
            return CheckResults::new();
        }

        debug!(
            count = self.endpoints.len(),
            "Starting parallel check for all endpoints"
        );

        let mut handles = Vec::with_capacity(self.endpoints.len());
        for (key, endpoint) in self.endpoints.iter() {
            let checker = self.checker.clone();
            let key = key.clone();
            let endpoint = endpoint.clone();
            let task_key = key.clone();
            handles.push((
                key,
                tokio::spawn(async move { checker.check(&task_key, &endpoint).await }),
            ));
        }

        let mut results = CheckResults::new();
        for (key, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(endpoint = %key, error = %e, "Check task join error");
                    CheckResult::error(&key, format!("Check task failed: {}", e))
                }
            };
            results.insert(key, result);
        }

        let success = results.values().filter(|r| r.is_success()).count();
        info!(
            success = success,
            failure = results.len() - success,
            "Parallel check completed"
        );

        results
    }
}
