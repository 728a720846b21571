pub mod config;
pub mod detector;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod schedule_window;
pub mod scheduler;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use detector::{AvailabilityDetector, MarkerKind, Verdict, detect};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use models::{CheckResult, CheckStatus};
pub use monitor::{AppointmentMonitor, TickOutcome};
pub use schedule_window::ScheduleWindow;
pub use scheduler::{JobHandle, JobInfo, JobStatus, MonitorScheduler};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
