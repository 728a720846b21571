use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::detector::{AvailabilityDetector, Verdict};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::models::CheckResult;
use crate::plugins::{NotifierPlugin, WebhookNotifier};
use crate::schedule_window::ScheduleWindow;
use crate::utils::error::{AppError, Result};

/// What happened on a scheduled tick.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The tick fell outside the allowed days/hours; nothing was fetched.
    OutsideWindow,
    Checked(CheckResult),
}

/// Fetches the appointment page, runs detection and forwards positive
/// results to the notifier.
pub struct AppointmentMonitor {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn NotifierPlugin>,
    detector: Arc<AvailabilityDetector>,
    window: ScheduleWindow,
    target_url: String,
}

impl AppointmentMonitor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn NotifierPlugin>,
        detector: AvailabilityDetector,
        window: ScheduleWindow,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            detector: Arc::new(detector),
            window,
            target_url: target_url.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.target)?;
        let notifier = WebhookNotifier::new(&config.notifications.webhook)?;
        let window = ScheduleWindow::from_config(&config.schedule)?;

        if !notifier.is_configured() {
            tracing::warn!(
                notifier = notifier.name(),
                "No webhook URL configured; positive results will only be logged"
            );
        }

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(notifier),
            AvailabilityDetector::from_config(&config.detector),
            window,
            config.target.url.clone(),
        ))
    }

    /// Fetch and detect once, ignoring the schedule window. Never notifies.
    ///
    /// Failures are folded into a result with `status = error`.
    pub async fn check_now(&self) -> CheckResult {
        let start_time = Instant::now();

        let result = match self.fetch_and_detect().await {
            Ok(verdict) => {
                tracing::info!("Appointments available: {}", verdict.available);
                CheckResult::success(&verdict, &self.target_url, Utc::now(), self.window.timezone())
            }
            Err(e) => {
                tracing::error!("Error in VHS monitoring: {}", e);
                CheckResult::error(e.to_string(), &self.target_url, Utc::now(), self.window.timezone())
            }
        };

        tracing::debug!(
            status = ?result.status,
            total_time_ms = start_time.elapsed().as_millis() as u64,
            "Check finished"
        );

        result
    }

    /// Scheduled entry point: gate on the window, check, and notify when
    /// appointments are available.
    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> TickOutcome {
        if !self.window.is_open_at(now) {
            tracing::info!("Outside allowed schedule. Skipping this run.");
            return TickOutcome::OutsideWindow;
        }

        tracing::info!("Within allowed schedule. Proceeding with appointment check.");

        let mut result = self.check_now().await;

        if result.appointments_available {
            tracing::info!("Appointments found! Sending notification...");
            let notification = self.notifier.notify(&result).await;
            if !notification.success {
                tracing::warn!(
                    notifier = self.notifier.name(),
                    status_code = ?notification.status_code,
                    error = ?notification.error,
                    "Notification was not delivered"
                );
            }
            result.notification_sent = Some(notification.success);
        }

        TickOutcome::Checked(result)
    }

    async fn fetch_and_detect(&self) -> Result<Verdict> {
        let page = self.fetcher.fetch(&self.target_url).await?;

        // Parsing is CPU-bound; keep it off the async workers. A panic inside
        // the parser surfaces here as a join error.
        let detector = Arc::clone(&self.detector);
        tokio::task::spawn_blocking(move || detector.detect(&page.body))
            .await
            .map_err(|e| AppError::Detection(format!("detection task failed: {}", e)))
    }
}
