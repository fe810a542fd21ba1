//! リトライポリシー
//!
//! トランスポート障害時の試行回数と指数バックオフの待機時間を決める。

use std::time::Duration;

/// デフォルトのバックオフ係数
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// リトライポリシー
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    /// 新しいポリシーを作成（`attempts`は最低1に丸める）
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }

    /// リトライなし（1回だけ試行）
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// バックオフ係数を設定
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// 最大試行回数
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 基準待機時間
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// バックオフ係数
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// `attempt_index`回目（0始まり）の試行が失敗した後の待機時間
    ///
    /// `base_delay * backoff_factor^attempt_index`
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
