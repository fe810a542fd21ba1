//! Ollama Monitor
//!
//! Ollamaサーバーのエンドポイント監視（ヘルスチェック・負荷テスト・継続監視・アラート）

#![warn(missing_docs)]

/// アラート管理（連続失敗・成功率低下の検知とWebhook配送）
pub mod alert;

/// CLIインターフェース
pub mod cli;

/// 設定管理（YAML・環境変数ヘルパー）
pub mod config;

/// エラー型定義
pub mod error;

/// ヘルスチェック（リトライ付きチェッカー・並列ランナー）
pub mod health;

/// 負荷テスト
pub mod load_test;

/// ロギング初期化ユーティリティ
pub mod logging;

/// メトリクス収集・公開
pub mod metrics;

/// 監視セッションと継続監視ループ
pub mod monitor;

/// レポート出力
pub mod report;

/// シャットダウン制御
pub mod shutdown;

/// 型定義
pub mod types;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use monitor::{ContinuousMonitor, MonitorHandle, MonitorSession};
