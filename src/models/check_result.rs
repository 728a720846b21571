use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::detector::Verdict;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Error,
}

/// Outcome of one availability check, as sent to the notifier and returned
/// by the manual endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub appointments_available: bool,
    pub candidate_sections: usize,
    pub markers: usize,
    /// Local time of the check in the monitor's timezone.
    pub timestamp: DateTime<FixedOffset>,
    pub url: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_sent: Option<bool>,
}

impl CheckResult {
    pub fn success(verdict: &Verdict, url: impl Into<String>, now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            appointments_available: verdict.available,
            candidate_sections: verdict.candidate_sections,
            markers: verdict.markers,
            timestamp: local_timestamp(now, timezone),
            url: url.into(),
            status: CheckStatus::Success,
            error: None,
            notification_sent: None,
        }
    }

    /// Failed check. Availability is always reported as false.
    pub fn error(message: impl Into<String>, url: impl Into<String>, now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            appointments_available: false,
            candidate_sections: 0,
            markers: 0,
            timestamp: local_timestamp(now, timezone),
            url: url.into(),
            status: CheckStatus::Error,
            error: Some(message.into()),
            notification_sent: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

fn local_timestamp(now: DateTime<Utc>, timezone: Tz) -> DateTime<FixedOffset> {
    now.with_timezone(&timezone).fixed_offset()
}
