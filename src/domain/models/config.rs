use serde::{Deserialize, Serialize};

/// Main configuration structure for the profiling service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Expertise tier configuration
    #[serde(default)]
    pub expertise: ExpertiseConfig,

    /// Task compatibility scoring configuration
    #[serde(default)]
    pub compatibility: CompatibilityConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".hotlabel/users.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Expertise tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExpertiseConfig {
    /// Completed-task counts at which each tier starts (strictly ascending)
    #[serde(default = "default_level_thresholds")]
    pub level_thresholds: Vec<i64>,
}

fn default_level_thresholds() -> Vec<i64> {
    vec![10, 50, 100, 250]
}

impl Default for ExpertiseConfig {
    fn default() -> Self {
        Self {
            level_thresholds: default_level_thresholds(),
        }
    }
}

/// Weights applied to the three compatibility factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompatibilityWeights {
    pub language: f64,
    pub complexity: f64,
    pub category: f64,
}

impl CompatibilityWeights {
    /// General-purpose scheme, the service default.
    pub const GENERAL: Self = Self {
        language: 0.4,
        complexity: 0.4,
        category: 0.2,
    };

    /// Language-heavy scheme used when building staircase task lists.
    pub const STAIRCASE: Self = Self {
        language: 0.5,
        complexity: 0.3,
        category: 0.2,
    };

    pub fn total(&self) -> f64 {
        self.language + self.complexity + self.category
    }
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self::GENERAL
    }
}

/// Task compatibility scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompatibilityConfig {
    #[serde(default)]
    pub weights: CompatibilityWeights,

    /// Minimum overall score for a task to count as compatible
    #[serde(default = "default_compatibility_threshold")]
    pub threshold: f64,
}

pub const DEFAULT_COMPATIBILITY_THRESHOLD: f64 = 0.5;

const fn default_compatibility_threshold() -> f64 {
    DEFAULT_COMPATIBILITY_THRESHOLD
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            weights: CompatibilityWeights::default(),
            threshold: default_compatibility_threshold(),
        }
    }
}
