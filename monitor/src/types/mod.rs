//! 型定義モジュール
//!
//! 監視エンジンが扱うドメイン型を提供

/// アラートペイロード
pub mod alert;
/// チェック結果
pub mod check;
/// エンドポイント設定
pub mod endpoint;

pub use alert::{Alert, AlertDetails, AlertSeverity, ALERT_SERVICE_NAME};
pub use check::{CheckOutcome, CheckResult, CheckResults};
pub use endpoint::{EndpointConfig, HttpMethod};
pub use load_test::{LatencyStats, LoadTestResult};
