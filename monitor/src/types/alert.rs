//! アラートペイロードの型定義

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// アラート送信元のサービス名
pub const ALERT_SERVICE_NAME: &str = "ollama-monitor";

/// アラートの重要度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// 情報
    Info,
    /// 警告（成功率低下）
    Warning,
    /// エラー（連続失敗）
    Error,
    /// 重大
    Critical,
}

impl AlertSeverity {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// アラート詳細
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertDetails {
    /// 連続失敗回数
    pub consecutive_failures: u64,
    /// 累積チェック回数
    pub total_checks: u64,
    /// 累積失敗回数
    pub total_failures: u64,
    /// 累積成功率（0.0-1.0）
    pub success_rate: f64,
    /// 直近の失敗メッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Webhookへ送信するアラート
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// 発生時刻（UTC, `Z`サフィックス）
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// 重要度
    pub severity: AlertSeverity,
    /// メッセージ
    pub message: String,
    /// サービス名（常に`ollama-monitor`）
    pub service: String,
    /// 対象エンドポイントキー
    pub endpoint: String,
    /// 詳細
    pub details: AlertDetails,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

impl Alert {
    /// 新しいアラートを作成
    pub fn new(
        severity: AlertSeverity,
        endpoint: impl Into<String>,
        message: impl Into<String>,
        details: AlertDetails,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            service: ALERT_SERVICE_NAME.to_string(),
            endpoint: endpoint.into(),
            details,
        }
    }
}
