//! Expert profile CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::area::resolve_area;
use crate::cli::context::AppContext;
use crate::cli::output::{list_table, or_dash, output, render_list, truncate, CommandOutput};
use crate::domain::models::UserProfile;
use crate::domain::ports::ProfileRepository;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create an expert profile
    Create {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Primary language
        #[arg(short, long)]
        language: Option<String>,
        /// Additional languages, comma separated
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,
        #[arg(long)]
        timezone: Option<String>,
        /// Expertise area IDs or slugs, comma separated
        #[arg(short, long, value_delimiter = ',')]
        areas: Vec<String>,
    },
    /// Show a profile with its expertise area names
    Show {
        /// Profile ID
        id: String,
    },
    /// Replace a profile's expertise areas
    SetAreas {
        /// Profile ID
        id: String,
        /// Expertise area IDs or slugs
        areas: Vec<String>,
    },
    /// Verify a profile as an expert
    Verify {
        /// Profile ID
        id: String,
    },
    /// List the profiles with the most completed tasks
    Top {
        /// Number of profiles to show (1-100)
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileOutput {
    pub id: String,
    pub display_name: Option<String>,
    pub primary_language: Option<String>,
    pub additional_languages: Vec<String>,
    pub timezone: Option<String>,
    pub expertise_level: u32,
    pub verified: bool,
    pub tasks_completed: i64,
    pub quality_score: i64,
    pub expertise_area_ids: Vec<String>,
    pub expertise_areas: Vec<String>,
}

impl ProfileOutput {
    fn new(profile: &UserProfile, area_names: Vec<String>) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            primary_language: profile.primary_language.clone(),
            additional_languages: profile.additional_languages.clone(),
            timezone: profile.timezone.clone(),
            expertise_level: profile.expertise_level,
            verified: profile.verified,
            tasks_completed: profile.tasks_completed,
            quality_score: profile.quality_score,
            expertise_area_ids: profile.expertise_area_ids.clone(),
            expertise_areas: area_names,
        }
    }
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Profile: {}", self.id),
            format!("Name: {}", or_dash(self.display_name.as_deref())),
            format!("Language: {}", or_dash(self.primary_language.as_deref())),
            format!("Timezone: {}", or_dash(self.timezone.as_deref())),
            format!("Expertise level: {}", self.expertise_level),
            format!("Tasks completed: {}", self.tasks_completed),
            format!("Quality score: {}", self.quality_score),
            format!("Verified: {}", self.verified),
        ];
        if !self.additional_languages.is_empty() {
            lines.push(format!("Also speaks: {}", self.additional_languages.join(", ")));
        }
        if !self.expertise_areas.is_empty() {
            lines.push("\nExpertise areas:".to_string());
            for name in &self.expertise_areas {
                lines.push(format!("  - {name}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileListOutput {
    pub profiles: Vec<UserProfile>,
    pub total: usize,
}

impl CommandOutput for ProfileListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["rank", "id", "name", "tasks", "level", "verified"]);
        for (rank, profile) in self.profiles.iter().enumerate() {
            table.add_row(vec![
                (rank + 1).to_string(),
                profile.id.clone(),
                truncate(profile.display_name.as_deref().unwrap_or("-"), 30),
                profile.tasks_completed.to_string(),
                profile.expertise_level.to_string(),
                if profile.verified { "yes" } else { "no" }.to_string(),
            ]);
        }
        render_list("profile", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

async fn resolve_area_ids(ctx: &AppContext, keys: &[String]) -> Result<Vec<String>> {
    let service = ctx.area_service();
    let mut ids = Vec::with_capacity(keys.len());
    for key in keys {
        let id = resolve_area(&service, key).await?.id;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub async fn execute(args: ProfileArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let directory = ctx.directory()?;
    let service = ctx.profile_service();

    match args.command {
        ProfileCommands::Create {
            name,
            language,
            languages,
            timezone,
            areas,
        } => {
            let mut profile = UserProfile::new();
            profile.display_name = name;
            profile.primary_language = language;
            profile.additional_languages = languages;
            profile.timezone = timezone;
            profile.expertise_area_ids = resolve_area_ids(ctx, &areas).await?;
            ctx.profiles.create(&profile).await?;

            let area_names = directory.area_names(&profile.expertise_area_ids).await;
            output(&ProfileOutput::new(&profile, area_names), json_mode);
        }
        ProfileCommands::Show { id } => {
            let profile = service.get(&id).await?;
            let area_names = directory.area_names(&profile.expertise_area_ids).await;
            output(&ProfileOutput::new(&profile, area_names), json_mode);
        }
        ProfileCommands::SetAreas { id, areas } => {
            let mut profile = service.get(&id).await?;
            profile.expertise_area_ids = resolve_area_ids(ctx, &areas).await?;
            profile.updated_at = chrono::Utc::now();
            ctx.profiles.update(&profile).await?;

            let area_names = directory.area_names(&profile.expertise_area_ids).await;
            output(&ProfileOutput::new(&profile, area_names), json_mode);
        }
        ProfileCommands::Verify { id } => {
            let profile = service.verify(&id).await?;
            let area_names = directory.area_names(&profile.expertise_area_ids).await;
            output(&ProfileOutput::new(&profile, area_names), json_mode);
        }
        ProfileCommands::Top { limit } => {
            let profiles = service.top_contributors(limit).await?;
            let total = profiles.len();
            output(&ProfileListOutput { profiles, total }, json_mode);
        }
    }

    Ok(())
}
