//! チェック結果の型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 1回のチェックの判定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// 期待通りのレスポンス
    Success,
    /// レスポンスは受信したが期待と不一致
    Failure,
    /// リトライを使い切ってもトランスポート障害が続いた
    Error,
}

impl CheckOutcome {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// 成功かどうか
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// エンドポイント1件のチェック結果
///
/// チェックごとに新しく生成され、チェック間で可変状態を共有しない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// エンドポイントキー
    pub endpoint: String,
    /// 判定
    pub outcome: CheckOutcome,
    /// 受信したステータスコード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 応答時間（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// エラーメッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 実際に行ったHTTP試行回数
    pub attempts: u32,
    /// チェック完了時刻
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    /// 成功結果を作成
    pub fn success(endpoint: impl Into<String>, status_code: u16, response_time: f64) -> Self {
        Self {
            endpoint: endpoint.into(),
            outcome: CheckOutcome::Success,
            status_code: Some(status_code),
            response_time: Some(response_time),
            error_message: None,
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    /// 期待不一致の結果を作成
    pub fn failure(
        endpoint: impl Into<String>,
        status_code: u16,
        response_time: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            outcome: CheckOutcome::Failure,
            status_code: Some(status_code),
            response_time: Some(response_time),
            error_message: Some(message.into()),
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    /// トランスポート障害の結果を作成
    pub fn error(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            outcome: CheckOutcome::Error,
            status_code: None,
            response_time: None,
            error_message: Some(message.into()),
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    /// 試行回数を設定
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// 成功かどうか
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// 1サイクル分の集約結果（エンドポイントキー順）
pub type CheckResults = BTreeMap<String, CheckResult>;
