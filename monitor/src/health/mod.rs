//! ヘルスチェック
//!
//! エンドポイント単位のリトライ付きチェックと、全エンドポイントの並列実行

pub mod endpoint_checker;
pub mod retry;
pub mod runner;

pub use endpoint_checker::{evaluate_response, EndpointChecker};
pub use retry::RetryPolicy;
pub use runner::CheckRunner;
