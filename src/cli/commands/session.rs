//! Session CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{or_dash, output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{LanguageDetection, SignalOutcome, UserSession, UserSignals};
use crate::domain::ports::{ProfileRepository, SessionRepository};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Create an anonymous session for a publisher
    Create {
        /// Publisher that owns the session
        publisher_id: String,
        /// Browser language (e.g. en, es-ES)
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        device_type: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Link the session to an expert profile
        #[arg(short, long)]
        profile: Option<String>,
        /// Record that the visitor gave consent
        #[arg(long)]
        consent: bool,
    },
    /// Show a session
    Show {
        /// Session ID
        id: String,
    },
    /// Apply a JSON file of browser signals to a session
    Signals {
        /// Session ID
        id: String,
        /// Path to a JSON signals document
        file: PathBuf,
    },
    /// Guess the language of a text sample
    DetectLanguage {
        /// Text to analyse
        text: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SessionOutput {
    pub id: String,
    pub publisher_id: String,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub device_type: Option<String>,
    pub platform: Option<String>,
    pub country: Option<String>,
    pub referrer: Option<String>,
    pub consent_given: bool,
    pub tasks_completed: i64,
    pub tasks_attempted: i64,
    pub profile_id: Option<String>,
    pub last_active: String,
}

impl From<&UserSession> for SessionOutput {
    fn from(session: &UserSession) -> Self {
        Self {
            id: session.id.clone(),
            publisher_id: session.publisher_id.clone(),
            language: session.language.clone(),
            timezone: session.timezone.clone(),
            device_type: session.device_type.clone(),
            platform: session.platform.clone(),
            country: session.country.clone(),
            referrer: session.referrer.clone(),
            consent_given: session.consent_given,
            tasks_completed: session.tasks_completed,
            tasks_attempted: session.tasks_attempted,
            profile_id: session.profile_id.clone(),
            last_active: session.last_active.to_rfc3339(),
        }
    }
}

impl CommandOutput for SessionOutput {
    fn to_human(&self) -> String {
        [
            format!("Session: {}", self.id),
            format!("Publisher: {}", self.publisher_id),
            format!("Language: {}", or_dash(self.language.as_deref())),
            format!("Timezone: {}", or_dash(self.timezone.as_deref())),
            format!(
                "Device: {} / {}",
                or_dash(self.device_type.as_deref()),
                or_dash(self.platform.as_deref())
            ),
            format!("Country: {}", or_dash(self.country.as_deref())),
            format!("Referrer: {}", or_dash(self.referrer.as_deref())),
            format!("Consent: {}", self.consent_given),
            format!("Tasks: {}/{} completed", self.tasks_completed, self.tasks_attempted),
            format!("Profile: {}", or_dash(self.profile_id.as_deref())),
            format!("Last active: {}", self.last_active),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SignalsOutput {
    #[serde(flatten)]
    pub outcome: SignalOutcome,
}

impl CommandOutput for SignalsOutput {
    fn to_human(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(", ")
            }
        };
        [
            format!("Signals applied to {}", self.outcome.session_id),
            format!("Updated fields: {}", list(&self.outcome.updated_fields)),
            format!("Inferred areas: {}", list(&self.outcome.inferred_areas)),
            format!("Linked to profile: {}", list(&self.outcome.linked_area_ids)),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct LanguageOutput {
    #[serde(flatten)]
    pub detection: LanguageDetection,
}

impl CommandOutput for LanguageOutput {
    fn to_human(&self) -> String {
        format!(
            "Detected language: {} (confidence {:.2})",
            self.detection.detected_language, self.detection.confidence
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SessionArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        SessionCommands::Create {
            publisher_id,
            language,
            timezone,
            device_type,
            platform,
            country,
            profile,
            consent,
        } => {
            if let Some(profile_id) = &profile {
                if ctx.profiles.get(profile_id).await?.is_none() {
                    return Err(DomainError::ProfileNotFound(profile_id.clone()).into());
                }
            }
            let mut session = UserSession::new(publisher_id);
            session.language = language;
            session.timezone = timezone;
            session.device_type = device_type;
            session.platform = platform;
            session.country = country;
            session.profile_id = profile;
            session.consent_given = consent;
            ctx.sessions.create(&session).await?;
            output(&SessionOutput::from(&session), json_mode);
        }
        SessionCommands::Show { id } => {
            let session = ctx
                .sessions
                .get(&id)
                .await?
                .ok_or(DomainError::SessionNotFound(id))?;
            output(&SessionOutput::from(&session), json_mode);
        }
        SessionCommands::Signals { id, file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let signals: UserSignals = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid signals document in {}", file.display()))?;
            let outcome = ctx.profiler_service().process_signals(&id, &signals).await?;
            output(&SignalsOutput { outcome }, json_mode);
        }
        SessionCommands::DetectLanguage { text } => {
            let detection = ctx.profiler_service().detect_language(&text);
            output(&LanguageOutput { detection }, json_mode);
        }
    }

    Ok(())
}
