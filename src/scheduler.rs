use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::models::CheckResult;
use crate::monitor::{AppointmentMonitor, TickOutcome};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: Option<Uuid>,
    pub cron_expression: String,
    pub status: JobStatus,
    /// A check is in flight at the time of the snapshot.
    #[serde(default)]
    pub running: bool,
    pub created_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub skipped_count: u64,
    pub overlapped_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub notifications_sent: u64,
    pub last_error: Option<String>,
    pub last_result: Option<CheckResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Paused,
    Error,
}

impl JobInfo {
    fn new(cron_expression: &str) -> Self {
        Self {
            id: None,
            cron_expression: cron_expression.to_string(),
            status: JobStatus::Active,
            running: false,
            created_at: Utc::now(),
            last_run: None,
            run_count: 0,
            skipped_count: 0,
            overlapped_count: 0,
            success_count: 0,
            error_count: 0,
            notifications_sent: 0,
            last_error: None,
            last_result: None,
        }
    }

    /// Fold a finished tick into the statistics. A pause requested while
    /// the check was running is kept.
    fn record(&mut self, outcome: &TickOutcome) {
        self.last_run = Some(Utc::now());
        self.run_count += 1;

        match outcome {
            TickOutcome::OutsideWindow => self.skipped_count += 1,
            TickOutcome::Checked(result) if result.is_success() => {
                self.success_count += 1;
                self.last_error = None;
                if result.notification_sent == Some(true) {
                    self.notifications_sent += 1;
                }
                if self.status == JobStatus::Error {
                    self.status = JobStatus::Active;
                }
                self.last_result = Some(result.clone());
            }
            TickOutcome::Checked(result) => {
                self.error_count += 1;
                self.last_error = result.error.clone();
                if self.status != JobStatus::Paused {
                    self.status = JobStatus::Error;
                }
                self.last_result = Some(result.clone());
            }
        }
    }
}

/// Shared state of the monitor job. Cheap to clone; every clone sees the
/// same statistics and the same single-flight guard.
#[derive(Clone)]
pub struct JobHandle {
    monitor: Arc<AppointmentMonitor>,
    job: Arc<RwLock<JobInfo>>,
    in_flight: Arc<Mutex<()>>,
}

impl JobHandle {
    pub async fn get_job_info(&self) -> JobInfo {
        let mut info = self.job.read().await.clone();
        info.running = self.is_job_running();
        info
    }

    pub fn is_job_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Pause scheduled checks. The cron job keeps firing but ticks are
    /// ignored until resumed.
    pub async fn pause_job(&self) {
        self.job.write().await.status = JobStatus::Paused;
        tracing::info!("Paused appointment monitor job");
    }

    pub async fn resume_job(&self) {
        self.job.write().await.status = JobStatus::Active;
        tracing::info!("Resumed appointment monitor job");
    }

    /// Run one scheduled tick for `now` with the same gating and
    /// bookkeeping as a cron-triggered one. Returns `None` when the tick was
    /// dropped (paused, or a check is already running).
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<TickOutcome> {
        if self.job.read().await.status == JobStatus::Paused {
            tracing::debug!("Monitor job paused, ignoring tick");
            return None;
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous check still running, skipping this tick");
            self.job.write().await.overlapped_count += 1;
            return None;
        };

        tracing::info!("VHS appointment timer triggered");
        let outcome = self.monitor.run_scheduled(now).await;

        if let TickOutcome::Checked(result) = &outcome {
            if !result.is_success() {
                tracing::error!("Scheduled check failed: {:?}", result.error);
            }
        }

        self.job.write().await.record(&outcome);
        Some(outcome)
    }

    /// Check immediately, outside of the schedule. Does not notify.
    pub async fn run_job_now(&self) -> Result<CheckResult> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(AppError::Validation("A check is already running".to_string()));
        };

        tracing::info!("Running immediate appointment check");
        Ok(self.monitor.check_now().await)
    }
}

/// Runs the monitor on a cron cadence. At most one check is in flight at a
/// time; a tick that fires while the previous one is still running is
/// dropped.
pub struct MonitorScheduler {
    scheduler: JobScheduler,
    handle: JobHandle,
}

impl MonitorScheduler {
    pub async fn new(monitor: Arc<AppointmentMonitor>, cron_expression: &str) -> Result<Self> {
        if !Self::validate_cron_expression(cron_expression) {
            return Err(AppError::Validation(format!("Invalid cron expression: {}", cron_expression)));
        }

        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            handle: JobHandle {
                monitor,
                job: Arc::new(RwLock::new(JobInfo::new(cron_expression))),
                in_flight: Arc::new(Mutex::new(())),
            },
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let cron_expression = self.handle.job.read().await.cron_expression.clone();
        let handle = self.handle.clone();

        let job = Job::new_async(cron_expression.as_str(), move |_uuid, _l| {
            let handle = handle.clone();
            Box::pin(async move {
                handle.tick(Utc::now()).await;
            })
        })?;

        let id = self.scheduler.add(job).await?;
        self.handle.job.write().await.id = Some(id);

        self.scheduler.start().await?;
        tracing::info!("Monitor scheduler started with interval: {}", cron_expression);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Monitor scheduler shutdown");
        Ok(())
    }

    /// Handle for callers that must not hold on to the scheduler itself
    /// while a check runs.
    pub fn handle(&self) -> JobHandle {
        self.handle.clone()
    }

    pub async fn get_job_info(&self) -> JobInfo {
        self.handle.get_job_info().await
    }

    pub fn is_job_running(&self) -> bool {
        self.handle.is_job_running()
    }

    pub async fn pause_job(&self) {
        self.handle.pause_job().await
    }

    pub async fn resume_job(&self) {
        self.handle.resume_job().await
    }

    pub async fn tick(&self, now: DateTime<Utc>) -> Option<TickOutcome> {
        self.handle.tick(now).await
    }

    pub async fn run_job_now(&self) -> Result<CheckResult> {
        self.handle.run_job_now().await
    }

    /// Six-field cron (sec min hour day month weekday), as used by
    /// `tokio-cron-scheduler`.
    pub fn validate_cron_expression(expression: &str) -> bool {
        crate::config::AppConfig::is_valid_cron(expression)
    }
}
