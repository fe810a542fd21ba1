//! Cooperative shutdown controller.
//!
//! 停止要求を出すのはホストプロセス（シグナルハンドラまたはテスト）だけで、
//! 監視ループと負荷テストは読み取るだけ。停止要求は新しいサイクル・リクエストの
//! 開始を止めるだけで、実行中のリクエストは完了またはタイムアウトまで走らせる。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

/// Cooperative shutdown signal.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownController {
    /// 新しいコントローラーを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake all waiters.
    pub fn request_shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent request cannot be missed.
        notified.as_mut().enable();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// `duration`だけ待機する。途中で停止要求があれば早期に戻る。
    ///
    /// 停止要求で中断された場合は`true`。
    pub async fn sleep_or_shutdown(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_shutdown_requested(),
            _ = self.wait() => true,
        }
    }
}

/// Ctrl-C / SIGTERM を受けたら停止要求を出すタスクを起動する
pub fn listen_for_signals(shutdown: ShutdownController) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received, stopping after the current cycle");
        shutdown.request_shutdown();
    })
}

/// 登録に失敗したシグナルは停止要求として扱わず、永久に待つ
async fn settle_signal(result: std::io::Result<()>, signal: &str) {
    if let Err(e) = result {
        tracing::error!(error = %e, signal, "Failed to listen for signal");
        std::future::pending::<()>().await;
    }
}

async fn ctrl_c() {
    settle_signal(tokio::signal::ctrl_c().await, "Ctrl-C").await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}
