use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::ScheduleConfig;
use crate::utils::error::AppError;

/// Weekdays and hours during which the monitor is allowed to hit the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    timezone: Tz,
    allowed_weekdays: Vec<Weekday>,
    start_hour: u32,
    end_hour: u32,
}

#[derive(Debug, Clone)]
pub struct WindowCheck {
    pub local_time: DateTime<Tz>,
    pub is_allowed_day: bool,
    pub is_allowed_time: bool,
}

impl WindowCheck {
    pub fn is_open(&self) -> bool {
        self.is_allowed_day && self.is_allowed_time
    }
}

impl ScheduleWindow {
    pub fn new(timezone: Tz, allowed_weekdays: Vec<Weekday>, start_hour: u32, end_hour: u32) -> Self {
        Self {
            timezone,
            allowed_weekdays,
            start_hour,
            end_hour,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, AppError> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid timezone: {}", config.timezone)))?;

        let allowed_weekdays = config
            .allowed_weekdays
            .iter()
            .map(|day| {
                day.trim()
                    .parse::<Weekday>()
                    .map_err(|_| AppError::Validation(format!("Invalid weekday: {}", day)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(timezone, allowed_weekdays, config.start_hour, config.end_hour))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone)
    }

    /// Evaluate both gates for `now`, converted to the window's timezone.
    pub fn check(&self, now: DateTime<Utc>) -> WindowCheck {
        let local_time = self.local_time(now);
        let weekday = local_time.weekday();
        let hour = local_time.hour();

        let is_allowed_day = self.allowed_weekdays.contains(&weekday);
        let is_allowed_time = self.start_hour <= hour && hour < self.end_hour;

        tracing::info!(
            "Current time: {} (Day: {}, Hour: {})",
            local_time.format("%Y-%m-%d %H:%M:%S %Z"),
            weekday,
            hour
        );
        tracing::info!("Is allowed day: {}, Is allowed time: {}", is_allowed_day, is_allowed_time);

        WindowCheck {
            local_time,
            is_allowed_day,
            is_allowed_time,
        }
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_open()
    }
}
