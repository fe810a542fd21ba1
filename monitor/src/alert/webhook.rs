//! アラート配送先

use crate::error::AlertDeliveryError;
use crate::types::Alert;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Webhook送信のタイムアウト
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// アラート配送先
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// アラートを1件配送する
    async fn send(&self, alert: &Alert) -> Result<(), AlertDeliveryError>;
}

/// JSONをPOSTするWebhook配送先
#[derive(Clone, Debug)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    /// 新しいWebhook配送先を作成
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// 送信先URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn is_accepted(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
    )
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertDeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(alert)
            .send()
            .await?;

        let status = response.status();
        if is_accepted(status) {
            debug!(
                endpoint = %alert.endpoint,
                severity = %alert.severity,
                status = status.as_u16(),
                "Alert delivered"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AlertDeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
