use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::CheckResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(status_code: u16) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn failed(status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            error: Some(error.into()),
        }
    }
}

/// Trait for notification sinks (webhooks and similar).
///
/// Delivery problems are reported through [`NotificationResult`] rather than
/// an error, so a failed notification never aborts a check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    async fn notify(&self, result: &CheckResult) -> NotificationResult;
    fn is_configured(&self) -> bool;
}
