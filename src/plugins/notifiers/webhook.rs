use crate::config::WebhookConfig;
use crate::models::CheckResult;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Posts the check result as JSON to an HTTP webhook, such as an Azure
/// Logic App trigger.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(WebhookNotifier {
            client,
            webhook_url: config.url.clone().filter(|u| !u.trim().is_empty()),
        })
    }

    fn is_accepted(status: StatusCode) -> bool {
        status == StatusCode::OK || status == StatusCode::ACCEPTED
    }
}

#[async_trait]
impl NotifierPlugin for WebhookNotifier {
    fn name(&self) -> &str {
        "Webhook Notifier"
    }

    fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn notify(&self, result: &CheckResult) -> NotificationResult {
        let Some(webhook_url) = &self.webhook_url else {
            tracing::warn!("Webhook URL not configured. Skipping notification.");
            return NotificationResult::failed(None, "webhook URL not configured");
        };

        let response = self
            .client
            .post(webhook_url)
            .json(result)
            .send()
            .await;

        match response {
            Ok(response) if Self::is_accepted(response.status()) => {
                tracing::info!(
                    "Successfully sent notification to webhook. Status: {}",
                    response.status().as_u16()
                );
                NotificationResult::delivered(response.status().as_u16())
            }
            Ok(response) => {
                let status = response.status();
                tracing::warn!("Webhook responded with status: {}", status.as_u16());
                NotificationResult::failed(Some(status.as_u16()), format!("unexpected status {}", status))
            }
            Err(e) => {
                tracing::error!("Error sending notification to webhook: {}", e);
                NotificationResult::failed(None, e.to_string())
            }
        }
    }
}
