//! HotLabel user profiling service
//!
//! Tracks anonymous sessions and opt-in expert profiles, maintains per-user
//! task statistics and an expertise-area taxonomy, and scores how well a
//! candidate task suits a user.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and repository ports
//! - **Service Layer** (`services`): the scoring engine and the operations built on it
//! - **Adapters** (`adapters`): SQLite implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): operator command-line interface
//!
//! # Example
//!
//! ```ignore
//! use hotlabel_users::services::{CompatibilityScorer, TaskCompatibilityService};
//!
//! let service = TaskCompatibilityService::new(directory, CompatibilityScorer::default());
//! let ranked = service.get_compatible_tasks("sess_1a2b3c4d", &tasks).await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CompatibilityResult, CompatibilityWeights, Config, DatabaseConfig, ExpertiseArea,
    LevelRecommendation, LoggingConfig, ScoredTask, TaskDescriptor, TaskEvent, UserProfile,
    UserSession, UserStatistics,
};
pub use domain::ports::{
    ExpertiseAreaRepository, ProfileRepository, SessionRepository, StatisticsRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CompatibilityScorer, ExpertiseAreaService, ExpertiseLevelCalculator, ProfilerService,
    StatisticsService, TaskCompatibilityService, UserDirectory,
};
