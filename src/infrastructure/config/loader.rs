use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::compatibility_scorer::validate_weights;
use crate::services::expertise_level::validate_thresholds;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid level thresholds: {0}")]
    InvalidLevelThresholds(String),

    #[error("Invalid compatibility weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid compatibility threshold: {0}. Must be within [0, 1]")]
    InvalidThreshold(f64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .hotlabel/config.yaml (project config, created by init)
    /// 3. .hotlabel/local.yaml (local overrides, optional)
    /// 4. Environment variables (HOTLABEL_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("HOTLABEL_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".hotlabel/config.yaml"))
            .merge(Yaml::file(".hotlabel/local.yaml"))
            .merge(Env::prefixed("HOTLABEL_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        validate_thresholds(&config.expertise.level_thresholds)
            .map_err(|e| ConfigError::InvalidLevelThresholds(e.to_string()))?;

        validate_weights(&config.compatibility.weights)
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;

        let threshold = config.compatibility.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{CompatibilityWeights, DatabaseConfig};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".hotlabel/users.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.expertise.level_thresholds, vec![10, 50, 100, 250]);
        assert_eq!(config.compatibility.weights, CompatibilityWeights::GENERAL);
        assert!((config.compatibility.threshold - 0.5).abs() < f64::EPSILON);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/users.db
  max_connections: 3
logging:
  level: debug
  format: json
expertise:
  level_thresholds: [5, 20, 60]
compatibility:
  weights:
    language: 0.5
    complexity: 0.3
    category: 0.2
  threshold: 0.6
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/users.db");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.rotation, "daily");
        assert_eq!(config.expertise.level_thresholds, vec![5, 20, 60]);
        assert_eq!(config.compatibility.weights, CompatibilityWeights::STAIRCASE);
        assert!((config.compatibility.threshold - 0.6).abs() < f64::EPSILON);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let config = Config {
            database: DatabaseConfig {
                path: String::new(),
                max_connections: 5,
            },
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = Config::default();
        config.expertise.level_thresholds = vec![10, 10, 50];
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLevelThresholds(_))
        ));

        config.expertise.level_thresholds = Vec::new();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_weights_must_sum_to_one() {
        let mut config = Config::default();
        config.compatibility.weights = CompatibilityWeights {
            language: 0.5,
            complexity: 0.5,
            category: 0.5,
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut config = Config::default();
        config.compatibility.threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("HOTLABEL_LOGGING__LEVEL", Some("debug")),
                ("HOTLABEL_COMPATIBILITY__THRESHOLD", Some("0.7")),
            ],
            || {
                let config: Config = Figment::new()
                    .merge(Serialized::defaults(Config::default()))
                    .merge(Env::prefixed("HOTLABEL_").split("__"))
                    .extract()
                    .unwrap();
                assert_eq!(config.logging.level, "debug");
                assert!((config.compatibility.threshold - 0.7).abs() < f64::EPSILON);
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "logging:\n  level: info\n  format: json\nexpertise:\n  level_thresholds: [5, 25]"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(config.logging.format, "json", "Base value should persist");
        assert_eq!(config.expertise.level_thresholds, vec![5, 25]);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_weights() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "compatibility:\n  weights:\n    language: 0.9\n    complexity: 0.9\n    category: 0.9"
        )
        .unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }
}
