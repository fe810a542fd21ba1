//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! 設定エラーだけが監視開始前に致命的となる。エンドポイント単位の障害は
//! `CheckResult`の中に閉じ込められ、アラート配送の失敗はログに残して握りつぶす。

use std::path::PathBuf;
use thiserror::Error;

/// 設定読み込み・検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 設定ファイルの読み込みに失敗
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// 設定ファイルのパス
        path: PathBuf,
        /// 元のI/Oエラー
        #[source]
        source: std::io::Error,
    },

    /// YAMLのパースに失敗
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// 検証エラー
    #[error("Validation error: {0}")]
    Validation(String),
}

/// 1回のHTTP試行で発生した障害
///
/// `Transport`のみリトライ対象。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// 接続失敗・タイムアウト・DNS解決失敗・ボディ読み取り失敗
    #[error("{0}")]
    Transport(String),

    /// リクエスト構築の失敗（不正なヘッダー値など）
    #[error("{0}")]
    Request(String),

    /// ステータスコードまたは期待コンテンツの不一致
    #[error("{0}")]
    Mismatch(String),
}

impl CheckError {
    /// リトライ対象かどうか
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// アラート配送エラー
#[derive(Debug, Error)]
pub enum AlertDeliveryError {
    /// Webhookへの送信に失敗
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Webhookが成功以外のステータスを返した
    #[error("Webhook rejected alert with status {status}: {body}")]
    Rejected {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        body: String,
    },
}

/// レポート生成エラー
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSONシリアライズ失敗
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV書き込み失敗
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTMLテンプレートの描画失敗
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// ファイル書き込み失敗
    #[error("Failed to write report {path}: {source}")]
    Io {
        /// 出力先パス
        path: PathBuf,
        /// 元のI/Oエラー
        #[source]
        source: std::io::Error,
    },
}

/// モニター全体のエラー型
#[derive(Debug, Error)]
pub enum MonitorError {
    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTPクライアントの構築に失敗
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// 設定に存在しないエンドポイント
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// 不正な引数
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// レポート生成エラー
    #[error(transparent)]
    Report(#[from] ReportError),

    /// メトリクス登録エラー
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl MonitorError {
    /// 監視開始前に発生し、プロセスを終了させるべきエラーかどうか
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::HttpClient(_) | Self::InvalidArgument(_)
        )
    }
}

/// モニター用Result型
pub type MonitorResult<T> = Result<T, MonitorError>;
