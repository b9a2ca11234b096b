//! Task compatibility CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, or_dash, output, render_list, CommandOutput};
use crate::domain::models::{CompatibilityResult, LevelRecommendation, ScoredTask, TaskDescriptor};

#[derive(Args, Debug)]
pub struct CompatArgs {
    #[command(subcommand)]
    pub command: CompatCommands,
}

#[derive(Subcommand, Debug)]
pub enum CompatCommands {
    /// Score one task for a user
    Score {
        /// Session or profile ID
        user_id: String,
        /// JSON file holding a single task descriptor
        #[arg(short, long)]
        task: PathBuf,
    },
    /// Rank a list of tasks for a user
    Rank {
        /// Session or profile ID
        user_id: String,
        /// JSON file holding an array of task descriptors
        #[arg(short, long)]
        tasks: PathBuf,
        /// Show at most this many tasks
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Recommend the tier of the user's next task
    Recommend {
        /// Session or profile ID
        user_id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ScoreOutput {
    pub user_id: String,
    pub task_id: String,
    #[serde(flatten)]
    pub result: CompatibilityResult,
}

impl CommandOutput for ScoreOutput {
    fn to_human(&self) -> String {
        let factors = &self.result.factors;
        [
            format!("Task {} for {}", self.task_id, self.user_id),
            format!(
                "Overall score: {:.3} ({})",
                self.result.overall_score,
                if self.result.is_compatible { "compatible" } else { "not compatible" }
            ),
            format!("  language:   {:.2}", factors.language),
            format!("  complexity: {:.2}", factors.complexity),
            format!("  category:   {:.2}", factors.category),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RankOutput {
    pub user_id: String,
    pub tasks: Vec<ScoredTask>,
    pub total: usize,
}

impl CommandOutput for RankOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["rank", "task", "type", "complexity", "language", "score", ""]);
        for (i, scored) in self.tasks.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                scored.task.id.clone(),
                or_dash(scored.task.task_type.as_deref()),
                scored
                    .task
                    .complexity
                    .map_or_else(|| "-".to_string(), |c| c.to_string()),
                or_dash(scored.task.language.as_deref()),
                format!("{:.3}", scored.compatibility.overall_score),
                if scored.is_challenge { "challenge" } else { "" }.to_string(),
            ]);
        }
        render_list("compatible task", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RecommendOutput {
    #[serde(flatten)]
    pub recommendation: LevelRecommendation,
}

impl CommandOutput for RecommendOutput {
    fn to_human(&self) -> String {
        let r = &self.recommendation;
        let next = r
            .next_threshold
            .map_or_else(|| "top tier".to_string(), |t| format!("{t} tasks"));
        let mut lines = vec![
            format!("User: {}", r.user_id),
            format!("Current level: {} ({} tasks completed)", r.current_level, r.tasks_completed),
            format!("Next tier at: {next} ({:.1}% through this tier)", r.progress_percentage),
            format!(
                "Recommended level: {} (confidence {:.1})",
                r.decision.recommended_level, r.decision.confidence
            ),
        ];
        if r.decision.should_advance {
            lines.push("Ready to advance.".to_string());
        }
        if r.decision.is_challenge_task {
            lines.push("Next task should be a challenge task.".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid task JSON in {}", path.display()))
}

pub async fn execute(args: CompatArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.compatibility_service()?;

    match args.command {
        CompatCommands::Score { user_id, task } => {
            let task: TaskDescriptor = read_json(&task).await?;
            let result = service.calculate_task_compatibility(&user_id, &task).await?;
            output(
                &ScoreOutput {
                    user_id,
                    task_id: task.id,
                    result,
                },
                json_mode,
            );
        }
        CompatCommands::Rank {
            user_id,
            tasks,
            limit,
        } => {
            let tasks: Vec<TaskDescriptor> = read_json(&tasks).await?;
            let mut ranked = service.get_compatible_tasks(&user_id, &tasks).await?;
            if let Some(limit) = limit {
                ranked.truncate(limit);
            }
            let total = ranked.len();
            output(
                &RankOutput {
                    user_id,
                    tasks: ranked,
                    total,
                },
                json_mode,
            );
        }
        CompatCommands::Recommend { user_id } => {
            let recommendation = service.recommend_next_task_level(&user_id).await?;
            output(&RecommendOutput { recommendation }, json_mode);
        }
    }

    Ok(())
}
