use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{AlertChannel, AlertError, AlertSeverity, RunAlert};
use crate::config::{WebhookConfig, WebhookFormat};

/// Writes alerts to the service log. Always installed.
pub struct LogChannel;

#[async_trait]
impl AlertChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &RunAlert) -> Result<(), AlertError> {
        match alert.severity {
            AlertSeverity::Failure => tracing::error!(
                run_id = %alert.run_id,
                success_rate = alert.success_rate,
                "{}",
                alert.summary()
            ),
            AlertSeverity::Degraded => tracing::warn!(
                run_id = %alert.run_id,
                success_rate = alert.success_rate,
                "{}",
                alert.summary()
            ),
        }
        Ok(())
    }
}

/// POSTs alerts to an HTTP endpoint.
pub struct WebhookChannel {
    name: String,
    url: String,
    format: WebhookFormat,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(config: &WebhookConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            format: config.format,
            client,
        }
    }

    /// Request body in the receiver's expected shape.
    pub fn payload(&self, alert: &RunAlert) -> serde_json::Value {
        match self.format {
            WebhookFormat::Generic => json!({ "alert": alert, "message": alert.summary() }),
            WebhookFormat::Slack => json!({ "text": alert.summary() }),
            WebhookFormat::Discord => json!({ "content": alert.summary() }),
        }
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, alert: &RunAlert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(alert))
            .send()
            .await
            .map_err(|e| AlertError::Delivery {
                channel: self.name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected {
                channel: self.name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Channels for a configuration: the log channel plus each webhook.
pub fn build_channels(webhooks: &[WebhookConfig]) -> Vec<Arc<dyn AlertChannel>> {
    let mut channels: Vec<Arc<dyn AlertChannel>> = vec![Arc::new(LogChannel)];
    for webhook in webhooks {
        channels.push(Arc::new(WebhookChannel::new(webhook)));
    }
    channels
}
