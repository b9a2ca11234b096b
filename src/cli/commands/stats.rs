//! Task statistics CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{
    GlobalAverages, PublisherSummary, TaskEvent, UserStatistics, DEFAULT_REPORT_DAYS,
};

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommands,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Record a task attempt for a session or profile
    Record {
        /// Session or profile ID
        user_id: String,
        /// Task type (e.g. text-classification)
        #[arg(short = 't', long = "type")]
        task_type: Option<String>,
        /// The task was abandoned rather than completed
        #[arg(long)]
        abandoned: bool,
        /// The completed task failed quality review
        #[arg(long)]
        failed: bool,
        /// Time spent on the task in milliseconds
        #[arg(short, long)]
        duration_ms: Option<i64>,
        /// Quality score in [0, 1]
        #[arg(short, long)]
        quality: Option<f64>,
    },
    /// Show statistics for a session or profile
    Show {
        /// Session or profile ID
        user_id: String,
    },
    /// Override the stored expertise level
    SetLevel {
        /// Session or profile ID
        user_id: String,
        /// Expertise tier
        level: u32,
    },
    /// Session and task metrics for a publisher
    Publisher {
        /// Publisher ID
        publisher_id: String,
        /// Reporting window in days (1-365)
        #[arg(long, default_value_t = DEFAULT_REPORT_DAYS)]
        days: i64,
    },
    /// Platform-wide statistics averages
    Global,
}

#[derive(Debug, serde::Serialize)]
pub struct StatsOutput {
    pub user_id: String,
    pub statistics: Option<UserStatistics>,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let Some(stats) = &self.statistics else {
            return format!("No tasks recorded for {} yet.", self.user_id);
        };

        let mut lines = vec![
            format!("Statistics for {}", self.user_id),
            format!("Expertise level: {}", stats.expertise_level),
            format!(
                "Tasks: {} completed / {} attempted ({} successful)",
                stats.total_tasks_completed, stats.total_tasks_attempted, stats.total_tasks_successful
            ),
            format!("Completion rate: {:.1}%", stats.completion_rate * 100.0),
            format!("Success rate: {:.1}%", stats.success_rate * 100.0),
            format!("Average quality: {:.2}", stats.average_quality_score),
            format!("Average time: {:.0} ms", stats.average_task_time_ms),
            format!("Active days: {}", stats.active_days),
            format!(
                "Engagement: {:.2}  Consistency: {:.2}",
                stats.engagement_score, stats.consistency_score
            ),
        ];

        if !stats.task_type_distribution.is_empty() {
            let mut table = list_table(&["task type", "count"]);
            for (task_type, count) in &stats.task_type_distribution {
                table.add_row(vec![task_type.clone(), count.to_string()]);
            }
            lines.push(format!("\n{table}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PublisherOutput {
    #[serde(flatten)]
    pub summary: PublisherSummary,
}

impl CommandOutput for PublisherOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        [
            format!("Publisher {} (last {} days)", s.publisher_id, s.period.days),
            format!(
                "Period: {} to {}",
                s.period.start.format("%Y-%m-%d"),
                s.period.end.format("%Y-%m-%d")
            ),
            format!("Sessions: {} active / {} total", s.active_sessions, s.total_sessions),
            format!(
                "Consent: {} sessions ({:.1}%)",
                s.consent_given_count,
                s.consent_rate * 100.0
            ),
            format!(
                "Tasks: {} completed / {} attempted ({:.1}%)",
                s.tasks_completed,
                s.tasks_attempted,
                s.completion_rate * 100.0
            ),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GlobalOutput {
    #[serde(flatten)]
    pub averages: GlobalAverages,
    pub total_users: i64,
}

impl GlobalOutput {
    fn new(averages: GlobalAverages) -> Self {
        Self {
            total_users: averages.total_users(),
            averages,
        }
    }
}

impl CommandOutput for GlobalOutput {
    fn to_human(&self) -> String {
        let a = &self.averages;
        [
            format!(
                "Users with statistics: {} ({} sessions, {} profiles)",
                self.total_users, a.session_count, a.profile_count
            ),
            format!("Average completion rate: {:.1}%", a.completion_rate * 100.0),
            format!("Average success rate: {:.1}%", a.success_rate * 100.0),
            format!("Average task time: {:.0} ms", a.average_task_time_ms),
            format!("Average quality: {:.2}", a.average_quality_score),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn build_event(
    task_type: Option<String>,
    abandoned: bool,
    failed: bool,
    duration_ms: Option<i64>,
    quality: Option<f64>,
) -> TaskEvent {
    TaskEvent {
        task_type,
        completed: !abandoned,
        successful: !abandoned && !failed,
        duration_ms,
        quality_score: quality,
    }
}

pub async fn execute(args: StatsArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.statistics_service()?;

    match args.command {
        StatsCommands::Record {
            user_id,
            task_type,
            abandoned,
            failed,
            duration_ms,
            quality,
        } => {
            let event = build_event(task_type, abandoned, failed, duration_ms, quality);
            let statistics = service.record_task(&user_id, &event).await?;
            output(
                &StatsOutput {
                    user_id,
                    statistics: Some(statistics),
                },
                json_mode,
            );
        }
        StatsCommands::Show { user_id } => {
            let statistics = service.get_statistics(&user_id).await?;
            output(&StatsOutput { user_id, statistics }, json_mode);
        }
        StatsCommands::SetLevel { user_id, level } => {
            let statistics = service.set_expertise_level(&user_id, level).await?;
            output(
                &StatsOutput {
                    user_id,
                    statistics: Some(statistics),
                },
                json_mode,
            );
        }
        StatsCommands::Publisher { publisher_id, days } => {
            let summary = service.publisher_summary(&publisher_id, days).await?;
            output(&PublisherOutput { summary }, json_mode);
        }
        StatsCommands::Global => {
            let averages = service.global_averages().await?;
            output(&GlobalOutput::new(averages), json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StatisticsOwner;

    #[test]
    fn test_build_event_flags() {
        let done = build_event(Some("ocr".to_string()), false, false, Some(1200), Some(0.8));
        assert!(done.completed && done.successful);

        let failed = build_event(None, false, true, None, None);
        assert!(failed.completed && !failed.successful);

        let abandoned = build_event(None, true, false, None, None);
        assert!(!abandoned.completed && !abandoned.successful);
    }

    #[test]
    fn test_human_output_without_statistics() {
        let out = StatsOutput {
            user_id: "sess_1234abcd".to_string(),
            statistics: None,
        };
        assert_eq!(out.to_human(), "No tasks recorded for sess_1234abcd yet.");
    }

    #[test]
    fn test_human_output_lists_task_types() {
        let mut stats = UserStatistics::new(StatisticsOwner::Session("sess_1234abcd".to_string()));
        stats.task_type_distribution.insert("ocr".to_string(), 3);
        let out = StatsOutput {
            user_id: "sess_1234abcd".to_string(),
            statistics: Some(stats),
        };
        let human = out.to_human();
        assert!(human.contains("TASK TYPE"));
        assert!(human.contains("ocr"));
    }

    #[test]
    fn test_global_output_reports_total_users() {
        let out = GlobalOutput::new(GlobalAverages {
            completion_rate: 0.5,
            session_count: 3,
            profile_count: 2,
            ..Default::default()
        });
        let json = out.to_json();
        assert_eq!(json["total_users"], 5);
        assert_eq!(json["session_count"], 3);
        assert!(out.to_human().contains("Average completion rate: 50.0%"));
    }
}
