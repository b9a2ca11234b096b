//! Per-user task performance statistics.
//!
//! One row exists per session or profile and is created lazily on the first
//! task event. Counters and running means are folded in by
//! [`UserStatistics::record`]; callers are responsible for applying events for
//! the same user one at a time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::short_id;
use crate::domain::errors::{DomainError, DomainResult};

/// Completed-task count at which the engagement task factor saturates.
const ENGAGEMENT_TASK_SATURATION: f64 = 100.0;

/// The entity a statistics row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StatisticsOwner {
    Session(String),
    Profile(String),
}

impl StatisticsOwner {
    pub fn id(&self) -> &str {
        match self {
            Self::Session(id) | Self::Profile(id) => id,
        }
    }
}

/// A single task attempt reported for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_type: Option<String>,
    pub completed: bool,
    /// QA verdict; only counted for completed tasks
    #[serde(default)]
    pub successful: bool,
    pub duration_ms: Option<i64>,
    /// Quality in [0, 1]; only folded in for completed tasks
    pub quality_score: Option<f64>,
}

impl TaskEvent {
    pub fn completed(task_type: impl Into<String>) -> Self {
        Self {
            task_type: Some(task_type.into()),
            completed: true,
            successful: true,
            ..Default::default()
        }
    }

    pub fn abandoned(task_type: impl Into<String>) -> Self {
        Self {
            task_type: Some(task_type.into()),
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality_score: f64) -> Self {
        self.quality_score = Some(quality_score);
        self
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn unsuccessful(mut self) -> Self {
        self.successful = false;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(q) = self.quality_score {
            if !(0.0..=1.0).contains(&q) {
                return Err(DomainError::InvalidArgument(format!(
                    "quality_score must be within [0, 1], got {q}"
                )));
            }
        }
        if let Some(d) = self.duration_ms {
            if d < 0 {
                return Err(DomainError::InvalidArgument(format!(
                    "duration_ms must be non-negative, got {d}"
                )));
            }
        }
        Ok(())
    }
}

/// Aggregate task statistics for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub id: String,
    pub owner: StatisticsOwner,
    pub total_tasks_completed: i64,
    pub total_tasks_attempted: i64,
    pub total_tasks_successful: i64,
    pub completion_rate: f64,
    pub success_rate: f64,
    pub average_task_time_ms: f64,
    /// Completed tasks that reported a duration.
    pub timed_samples: i64,
    pub fastest_task_time_ms: i64,
    pub slowest_task_time_ms: i64,
    pub task_type_distribution: BTreeMap<String, i64>,
    pub average_quality_score: f64,
    /// Completed tasks that reported a quality score.
    pub quality_samples: i64,
    pub quality_distribution: BTreeMap<String, i64>,
    pub expertise_level: u32,
    pub first_task_date: Option<DateTime<Utc>>,
    pub last_task_date: Option<DateTime<Utc>>,
    pub active_days: i64,
    pub engagement_score: f64,
    pub consistency_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserStatistics {
    pub fn new(owner: StatisticsOwner) -> Self {
        let now = Utc::now();
        Self {
            id: short_id("stat"),
            owner,
            total_tasks_completed: 0,
            total_tasks_attempted: 0,
            total_tasks_successful: 0,
            completion_rate: 0.0,
            success_rate: 0.0,
            average_task_time_ms: 0.0,
            timed_samples: 0,
            fastest_task_time_ms: 0,
            slowest_task_time_ms: 0,
            task_type_distribution: BTreeMap::new(),
            average_quality_score: 0.0,
            quality_samples: 0,
            quality_distribution: BTreeMap::new(),
            expertise_level: 0,
            first_task_date: None,
            last_task_date: None,
            active_days: 0,
            engagement_score: 0.0,
            consistency_score: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any prior task was recorded under `task_type`.
    pub fn has_completed_type(&self, task_type: &str) -> bool {
        self.task_type_distribution
            .get(task_type)
            .is_some_and(|count| *count > 0)
    }

    /// Reject rows whose counters or rates cannot come from `record`.
    pub fn validate(&self) -> DomainResult<()> {
        if self.total_tasks_completed < 0 || self.total_tasks_attempted < 0 {
            return Err(DomainError::InvalidArgument(format!(
                "statistics {} has negative task counters",
                self.id
            )));
        }
        if self.quality_samples < 0
            || self.timed_samples < 0
            || self.quality_samples > self.total_tasks_completed
            || self.timed_samples > self.total_tasks_completed
        {
            return Err(DomainError::InvalidArgument(format!(
                "statistics {} has sample counts outside [0, completed]",
                self.id
            )));
        }
        if self.total_tasks_completed > self.total_tasks_attempted {
            return Err(DomainError::InvalidArgument(format!(
                "statistics {} has {} completed tasks but only {} attempted",
                self.id, self.total_tasks_completed, self.total_tasks_attempted
            )));
        }
        for (name, value) in [
            ("completion_rate", self.completion_rate),
            ("success_rate", self.success_rate),
            ("average_quality_score", self.average_quality_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidArgument(format!(
                    "statistics {} has {name} {value} outside [0, 1]",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Fold one task event into the aggregates.
    pub fn record(&mut self, event: &TaskEvent, now: DateTime<Utc>) -> DomainResult<()> {
        event.validate()?;

        self.total_tasks_attempted += 1;
        if event.completed {
            self.total_tasks_completed += 1;
            if event.successful {
                self.total_tasks_successful += 1;
            }
        }

        let attempted = self.total_tasks_attempted as f64;
        self.completion_rate = self.total_tasks_completed as f64 / attempted;
        self.success_rate = self.total_tasks_successful as f64 / attempted;

        if let Some(task_type) = &event.task_type {
            *self
                .task_type_distribution
                .entry(task_type.clone())
                .or_insert(0) += 1;
        }

        if event.completed {
            if let Some(duration) = event.duration_ms {
                if self.fastest_task_time_ms == 0 || duration < self.fastest_task_time_ms {
                    self.fastest_task_time_ms = duration;
                }
                self.slowest_task_time_ms = self.slowest_task_time_ms.max(duration);
                self.timed_samples += 1;
                self.average_task_time_ms = running_mean(
                    self.average_task_time_ms,
                    duration as f64,
                    self.timed_samples as f64,
                );
            }

            if let Some(quality) = event.quality_score {
                *self
                    .quality_distribution
                    .entry(quality_bucket(quality))
                    .or_insert(0) += 1;
                self.quality_samples += 1;
                self.average_quality_score = running_mean(
                    self.average_quality_score,
                    quality,
                    self.quality_samples as f64,
                );
            }
        }

        match self.last_task_date {
            Some(last) if last.date_naive() == now.date_naive() => {}
            _ => self.active_days += 1,
        }
        if self.first_task_date.is_none() {
            self.first_task_date = Some(now);
        }
        self.last_task_date = Some(now);

        self.update_engagement_score();
        self.update_consistency_score(now);
        self.updated_at = now;
        Ok(())
    }

    fn update_engagement_score(&mut self) {
        let tasks_factor =
            (self.total_tasks_completed as f64 / ENGAGEMENT_TASK_SATURATION).min(1.0);
        self.engagement_score = 0.7 * tasks_factor + 0.3 * self.average_quality_score;
    }

    fn update_consistency_score(&mut self, now: DateTime<Utc>) {
        let Some(first) = self.first_task_date else {
            self.consistency_score = 0.0;
            return;
        };
        let days_since_first = (now.date_naive() - first.date_naive()).num_days() + 1;
        self.consistency_score = if days_since_first > 0 {
            (self.active_days as f64 / days_since_first as f64).min(1.0)
        } else {
            1.0
        };
    }
}

fn running_mean(mean: f64, sample: f64, count: f64) -> f64 {
    if count <= 1.0 {
        sample
    } else {
        (mean * (count - 1.0) + sample) / count
    }
}

/// Histogram bucket for a quality score, floored to one decimal: 0.87 -> "0.8".
fn quality_bucket(quality: f64) -> String {
    format!("{:.1}", (quality * 10.0).floor() / 10.0)
}
