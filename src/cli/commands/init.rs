//! Implementation of the `hotlabel-users init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DatabaseConfig};

const CONFIG_DIR: &str = ".hotlabel";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub database_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!(
                "\nWrote default configuration to {}/{}",
                CONFIG_DIR, CONFIG_FILE
            ));
        }
        lines.push(format!("Database ready at {}", self.database_path.display()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, config: Config, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let config_dir = target_path.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let config_path = config_dir.join(CONFIG_FILE);
    let config_written = if config_path.exists() && !args.force {
        false
    } else {
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        fs::write(&config_path, yaml)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    };

    let database_path = resolve_database_path(&target_path, &config.database.path);
    let database = DatabaseConfig {
        path: database_path.to_string_lossy().into_owned(),
        ..config.database.clone()
    };
    initialize_database(&database)
        .await
        .context("Failed to initialize database")?;

    tracing::info!(path = %target_path.display(), config_written, "initialized workspace");

    let output_data = InitOutput {
        success: true,
        message: if config_written || args.force {
            "Project initialized successfully.".to_string()
        } else {
            "Project already initialized; kept existing configuration. Use --force to overwrite.".to_string()
        },
        initialized_path: target_path,
        config_written,
        database_path,
    };
    output(&output_data, json_mode);
    Ok(())
}

fn resolve_database_path(target: &Path, configured: &str) -> PathBuf {
    let configured = Path::new(configured);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        target.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_database_path_lands_in_target() {
        let resolved = resolve_database_path(Path::new("/srv/app"), ".hotlabel/users.db");
        assert_eq!(resolved, PathBuf::from("/srv/app/.hotlabel/users.db"));
    }

    #[test]
    fn test_absolute_database_path_kept() {
        let resolved = resolve_database_path(Path::new("/srv/app"), "/var/lib/users.db");
        assert_eq!(resolved, PathBuf::from("/var/lib/users.db"));
    }

    #[tokio::test]
    async fn test_init_writes_config_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, Config::default(), true).await.unwrap();

        assert!(dir.path().join(".hotlabel/config.yaml").exists());
        assert!(dir.path().join(".hotlabel/users.db").exists());

        let written = std::fs::read_to_string(dir.path().join(".hotlabel/config.yaml")).unwrap();
        let parsed: Config = serde_yaml::from_str(&written).unwrap();
        assert_eq!(parsed.expertise.level_thresholds, vec![10, 50, 100, 250]);
    }
}
