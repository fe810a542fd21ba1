//! `/metrics`エンドポイントの公開

use super::PrometheusMetrics;
use crate::shutdown::ShutdownController;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use tracing::{error, info};

/// デフォルトのメトリクスポート
pub const DEFAULT_METRICS_PORT: u16 = 8000;

/// メトリクス用ルーター
pub fn router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// メトリクスサーバーを起動し、停止要求まで待機する
pub async fn serve(
    metrics: PrometheusMetrics,
    addr: SocketAddr,
    shutdown: ShutdownController,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Prometheus metrics available on http://{}/metrics", listener.local_addr()?);

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}
