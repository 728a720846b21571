use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::TargetConfig;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
    pub final_url: String, // After redirects
    pub response_time_ms: u64,
}

/// Retrieves the decoded HTML of a page.
///
/// Implementations must report every failure as an error. An empty body is
/// only returned when the server really sent one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn body_too_large(&self, url: &str) -> AppError {
        AppError::Fetch {
            url: url.to_string(),
            message: format!("response body exceeds {} bytes", self.max_body_bytes),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let start_time = Instant::now();

        let mut response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Fetch {
                    url: url.to_string(),
                    message: "request timed out".to_string(),
                }
            } else {
                AppError::Http(e)
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            tracing::warn!("Fetching {} returned status {}", url, status);
            return Err(AppError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if response.content_length().is_some_and(|length| length > self.max_body_bytes) {
            return Err(self.body_too_large(url));
        }

        // Content-Length can be absent or wrong, so the cap is enforced while reading too.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(self.body_too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            response_time_ms,
            "Fetched page"
        );

        Ok(FetchedPage {
            body,
            status: status.as_u16(),
            final_url,
            response_time_ms,
        })
    }
}
