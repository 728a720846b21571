use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tokio_cron_scheduler::Job;
use url::Url;

use crate::detector::{BOOKING_KEYWORDS, CART_CLASS_MARKERS, CART_ICON_CLASS, CONTAINER_TAGS};

pub const DEFAULT_TARGET_URL: &str = "https://www.darmstadt-vhs.de/einbuergerungstest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub schedule: ScheduleConfig,
    pub notifications: NotificationsConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    /// Seconds.
    pub request_timeout: u64,
    pub user_agent: String,
    /// Largest response body accepted, in bytes.
    pub max_body_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression, seconds first.
    pub cron: String,
    pub timezone: String,
    pub allowed_weekdays: Vec<String>,
    pub start_hour: u32,
    /// Exclusive.
    pub end_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub booking_keywords: Vec<String>,
    pub container_tags: Vec<String>,
    pub cart_icon_class: String,
    pub cart_class_markers: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        Self {
            booking_keywords: owned(BOOKING_KEYWORDS),
            container_tags: owned(CONTAINER_TAGS),
            cart_icon_class: CART_ICON_CLASS.to_string(),
            cart_class_markers: owned(CART_CLASS_MARKERS),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig {
                url: DEFAULT_TARGET_URL.to_string(),
                request_timeout: 30,
                user_agent: concat!("vhs-termin-watcher/", env!("CARGO_PKG_VERSION")).to_string(),
                max_body_bytes: 2 * 1024 * 1024,
            },
            schedule: ScheduleConfig {
                cron: "0 */10 * * * *".to_string(),
                timezone: "Europe/Berlin".to_string(),
                allowed_weekdays: vec!["mon".to_string(), "tue".to_string(), "thu".to_string()],
                start_hour: 7,
                end_hour: 16,
            },
            notifications: NotificationsConfig {
                webhook: WebhookConfig {
                    url: None,
                    timeout: 30,
                },
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 7071,
            },
            detector: DetectorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::environment())
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    /// Load a single configuration file on top of the built-in defaults.
    /// Environment variables still take precedence.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = Self::with_defaults(Config::builder())?
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = AppConfig::default();
        let detector = defaults.detector;

        builder
            .set_default("target.url", defaults.target.url)?
            .set_default("target.request_timeout", defaults.target.request_timeout as i64)?
            .set_default("target.user_agent", defaults.target.user_agent)?
            .set_default("target.max_body_bytes", defaults.target.max_body_bytes as i64)?
            .set_default("schedule.cron", defaults.schedule.cron)?
            .set_default("schedule.timezone", defaults.schedule.timezone)?
            .set_default("schedule.allowed_weekdays", defaults.schedule.allowed_weekdays)?
            .set_default("schedule.start_hour", defaults.schedule.start_hour as i64)?
            .set_default("schedule.end_hour", defaults.schedule.end_hour as i64)?
            .set_default("notifications.webhook.timeout", defaults.notifications.webhook.timeout as i64)?
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("detector.booking_keywords", detector.booking_keywords)?
            .set_default("detector.container_tags", detector.container_tags)?
            .set_default("detector.cart_icon_class", detector.cart_icon_class)?
            .set_default("detector.cart_class_markers", detector.cart_class_markers)
    }

    fn environment() -> Environment {
        // VHS__SCHEDULE__ALLOWED_WEEKDAYS=mon,tue
        Environment::with_prefix("VHS")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("schedule.allowed_weekdays")
            .with_list_parse_key("detector.booking_keywords")
            .with_list_parse_key("detector.container_tags")
            .with_list_parse_key("detector.cart_class_markers")
    }

    fn finish(mut config: AppConfig) -> Result<Self, ConfigError> {
        // Variable name used by the Logic App deployment
        if config.notifications.webhook.url.is_none() {
            config.notifications.webhook.url = env::var("LOGIC_APP_URL").ok().filter(|u| !u.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.target.url).is_err() {
            return Err(ConfigError::Message("Invalid target URL format".into()));
        }

        if self.target.request_timeout == 0 {
            return Err(ConfigError::Message("Target request_timeout must be greater than 0".into()));
        }

        if self.target.max_body_bytes == 0 {
            return Err(ConfigError::Message("Target max_body_bytes must be greater than 0".into()));
        }

        if !Self::is_valid_cron(&self.schedule.cron) {
            return Err(ConfigError::Message("Invalid cron expression in schedule.cron".into()));
        }

        if self.schedule.timezone.parse::<Tz>().is_err() {
            return Err(ConfigError::Message(format!(
                "Unknown timezone in schedule.timezone: {}",
                self.schedule.timezone
            )));
        }

        if self.schedule.allowed_weekdays.is_empty() {
            return Err(ConfigError::Message("schedule.allowed_weekdays must not be empty".into()));
        }

        for day in &self.schedule.allowed_weekdays {
            if day.trim().parse::<Weekday>().is_err() {
                return Err(ConfigError::Message(format!("Invalid weekday in schedule.allowed_weekdays: {}", day)));
            }
        }

        if self.schedule.start_hour > 23 || self.schedule.end_hour > 24 {
            return Err(ConfigError::Message("Schedule hours must be within 0-24".into()));
        }

        if self.schedule.start_hour >= self.schedule.end_hour {
            return Err(ConfigError::Message("schedule.start_hour must be before schedule.end_hour".into()));
        }

        if let Some(webhook_url) = &self.notifications.webhook.url {
            if Url::parse(webhook_url).is_err() {
                return Err(ConfigError::Message("Invalid webhook URL format".into()));
            }
        }

        if self.notifications.webhook.timeout == 0 {
            return Err(ConfigError::Message("Webhook timeout must be greater than 0".into()));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.detector.booking_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Message("detector.booking_keywords must not be empty".into()));
        }

        if self.detector.container_tags.is_empty() {
            return Err(ConfigError::Message("detector.container_tags must not be empty".into()));
        }

        Ok(())
    }

    /// Six-field cron (sec min hour day month weekday), parsed the same way
    /// the scheduler parses it so out-of-range fields are rejected up front.
    pub fn is_valid_cron(cron_expr: &str) -> bool {
        if cron_expr.split_whitespace().count() != 6 {
            return false;
        }

        Job::new(cron_expr, |_uuid, _l| {}).is_ok()
    }
}
