//! Aggregate reports across users: per-publisher activity and platform averages.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Longest reporting window, in days.
pub const MAX_REPORT_DAYS: i64 = 365;
pub const DEFAULT_REPORT_DAYS: i64 = 30;

/// Raw session counts for one publisher, as read from storage.
///
/// `total_sessions` counts every session of the publisher. The remaining
/// counters only cover sessions active since the start of the window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherActivity {
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub consent_given_count: i64,
    pub tasks_completed: i64,
    pub tasks_attempted: i64,
}

/// Reporting window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
}

impl ReportPeriod {
    /// The `days` days up to `end`; `days` must be within 1..=365.
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> DomainResult<Self> {
        if !(1..=MAX_REPORT_DAYS).contains(&days) {
            return Err(DomainError::InvalidArgument(format!(
                "report window must be between 1 and {MAX_REPORT_DAYS} days, got {days}"
            )));
        }
        Ok(Self {
            start: end - Duration::days(days),
            end,
            days,
        })
    }
}

/// Session and task metrics for one publisher over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherSummary {
    pub publisher_id: String,
    pub period: ReportPeriod,
    pub total_sessions: i64,
    pub active_sessions: i64,
    pub consent_given_count: i64,
    pub consent_rate: f64,
    pub tasks_completed: i64,
    pub tasks_attempted: i64,
    pub completion_rate: f64,
}

impl PublisherSummary {
    pub fn new(publisher_id: impl Into<String>, period: ReportPeriod, activity: PublisherActivity) -> Self {
        Self {
            publisher_id: publisher_id.into(),
            period,
            consent_rate: ratio(activity.consent_given_count, activity.active_sessions),
            completion_rate: ratio(activity.tasks_completed, activity.tasks_attempted),
            total_sessions: activity.total_sessions,
            active_sessions: activity.active_sessions,
            consent_given_count: activity.consent_given_count,
            tasks_completed: activity.tasks_completed,
            tasks_attempted: activity.tasks_attempted,
        }
    }
}

/// Mean rates over every statistics row on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalAverages {
    pub completion_rate: f64,
    pub success_rate: f64,
    pub average_task_time_ms: f64,
    pub average_quality_score: f64,
    pub session_count: i64,
    pub profile_count: i64,
}

impl GlobalAverages {
    pub fn total_users(&self) -> i64 {
        self.session_count + self.profile_count
    }
}

fn ratio(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}
